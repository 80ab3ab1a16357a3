//! Invariant-derived field labels: `degree.real_places.|discriminant|.ordinal`.

mod allocate;


pub use allocate::{allocate_label, next_ordinal};

use crate::{error::ErrorClass, field::FieldInvariants};
use num_bigint::BigInt;
use num_traits::{One, Signed};
use std::{
    fmt::{self, Display},
    str::FromStr,
};
use thiserror::Error as ThisError;

///
/// LabelError
///

#[derive(Debug, ThisError)]
pub enum LabelError {
    #[error("no free ordinal for prefix '{prefix}' after {attempts} attempts")]
    Exhausted { prefix: String, attempts: u32 },

    #[error("invalid label '{label}': {reason}")]
    Malformed { label: String, reason: &'static str },

    #[error("label '{label}' does not agree with invariant prefix '{expected}'")]
    PrefixMismatch { label: String, expected: String },

    #[error("label '{label}' is longer than {max} characters")]
    TooLong { label: String, max: u32 },
}

impl LabelError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Exhausted { .. } => ErrorClass::DuplicateField,
            Self::Malformed { .. } | Self::PrefixMismatch { .. } | Self::TooLong { .. } => {
                ErrorClass::InvalidLabel
            }
        }
    }
}

///
/// LabelPrefix
///
/// The invariant part of a label, rendered with its trailing dot.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LabelPrefix {
    pub degree: u32,
    pub real_places: u32,
    pub abs_discriminant: BigInt,
}

impl LabelPrefix {
    #[must_use]
    pub fn from_invariants(inv: &FieldInvariants) -> Self {
        Self {
            degree: inv.degree,
            real_places: inv.signature.real,
            abs_discriminant: inv.abs_discriminant(),
        }
    }

    #[must_use]
    pub fn label(self, ordinal: u64) -> Label {
        Label {
            degree: self.degree,
            real_places: self.real_places,
            abs_discriminant: self.abs_discriminant,
            ordinal,
        }
    }
}

impl Display for LabelPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.",
            self.degree, self.real_places, self.abs_discriminant
        )
    }
}

///
/// Label
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label {
    pub degree: u32,
    pub real_places: u32,
    pub abs_discriminant: BigInt,
    pub ordinal: u64,
}

impl Label {
    /// Reserved label of the rational field.
    #[must_use]
    pub fn rational() -> Self {
        Self {
            degree: 1,
            real_places: 1,
            abs_discriminant: BigInt::one(),
            ordinal: 1,
        }
    }

    #[must_use]
    pub fn is_rational(&self) -> bool {
        *self == Self::rational()
    }

    #[must_use]
    pub fn prefix(&self) -> LabelPrefix {
        LabelPrefix {
            degree: self.degree,
            real_places: self.real_places,
            abs_discriminant: self.abs_discriminant.clone(),
        }
    }

    /// Label with the next ordinal in the same prefix.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            ordinal: self.ordinal + 1,
            ..self.clone()
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.degree, self.real_places, self.abs_discriminant, self.ordinal
        )
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| LabelError::Malformed {
            label: s.to_string(),
            reason,
        };

        let parts: Vec<&str> = s.split('.').collect();
        let [degree, real, disc, ordinal] = parts[..] else {
            return Err(malformed("expected four dot-separated parts"));
        };
        for part in &parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed("parts must be unsigned decimal integers"));
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(malformed("parts must not have leading zeros"));
            }
        }

        let degree: u32 = degree.parse().map_err(|_| malformed("degree out of range"))?;
        let real_places: u32 = real
            .parse()
            .map_err(|_| malformed("real places out of range"))?;
        let abs_discriminant: BigInt = disc
            .parse()
            .map_err(|_| malformed("discriminant is not an integer"))?;
        let ordinal: u64 = ordinal
            .parse()
            .map_err(|_| malformed("ordinal out of range"))?;

        if degree == 0 {
            return Err(malformed("degree must be positive"));
        }
        if real_places > degree || (degree - real_places) % 2 != 0 {
            return Err(malformed("real places do not fit the degree"));
        }
        if !abs_discriminant.is_positive() {
            return Err(malformed("discriminant must be positive"));
        }
        if ordinal == 0 {
            return Err(malformed("ordinal must be positive"));
        }

        Ok(Self {
            degree,
            real_places,
            abs_discriminant,
            ordinal,
        })
    }
}
