use num_bigint::BigInt;
use num_traits::{One, Signed};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// Signature
///
/// (real embeddings, complex-conjugate pairs).
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Signature {
    pub real: u32,
    pub complex: u32,
}

impl Signature {
    #[must_use]
    pub const fn new(real: u32, complex: u32) -> Self {
        Self { real, complex }
    }

    /// Degree implied by the signature, `r + 2s`.
    #[must_use]
    pub const fn degree(self) -> u32 {
        self.real + 2 * self.complex
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.real, self.complex)
    }
}

///
/// FieldInvariants
///
/// Arithmetic invariants of a number field, as computed by a reduction
/// backend. `conductor` is present exactly when the field is abelian.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldInvariants {
    pub degree: u32,
    pub signature: Signature,
    #[serde(with = "crate::serialize::decimal")]
    pub discriminant: BigInt,
    pub class_number: u64,
    #[serde(default, with = "crate::serialize::decimal::option")]
    pub conductor: Option<BigInt>,
}

impl FieldInvariants {
    /// Fixed invariants of the rational field.
    #[must_use]
    pub fn rational() -> Self {
        Self {
            degree: 1,
            signature: Signature::new(1, 0),
            discriminant: BigInt::one(),
            class_number: 1,
            conductor: Some(BigInt::one()),
        }
    }

    #[must_use]
    pub const fn is_abelian(&self) -> bool {
        self.conductor.is_some()
    }

    #[must_use]
    pub fn abs_discriminant(&self) -> BigInt {
        self.discriminant.abs()
    }

    /// Internal consistency: signature adds up to the degree and the
    /// class number is positive.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.degree >= 1 && self.signature.degree() == self.degree && self.class_number >= 1
    }
}

///
/// TESTS
///
