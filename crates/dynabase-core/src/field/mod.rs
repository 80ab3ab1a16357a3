//! Number field presentations and their canonical forms.
//!
//! A field is presented by a defining polynomial and a generator name, with
//! an optional complex embedding of the generator. Canonical forms are
//! computed through a [`FieldBackend`].

pub mod backend;
mod check;
mod invariants;
mod map;
mod normalize;
mod poly;

pub use backend::{FieldBackend, NativeBackend, Reduction, TableBackend, TableField};
pub use check::is_normalized;
pub use invariants::{FieldInvariants, Signature};
pub use map::FieldMap;
pub use normalize::{Normalized, normalize};
pub use poly::{Polynomial, PolynomialDisplay};

pub(crate) use map::ratio;

use crate::error::ErrorClass;
use num_complex::Complex64;
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

/// Generator name every canonical field uses.
pub const CANONICAL_GENERATOR: &str = "a";

///
/// FieldError
///

#[derive(Debug, ThisError)]
pub enum FieldError {
    #[error("backend '{backend}' violated its contract: {message}")]
    BackendContract {
        backend: &'static str,
        message: String,
    },

    #[error("constant polynomial {polynomial} does not define a number field")]
    ConstantPolynomial { polynomial: String },

    #[error("discriminant {discriminant} is beyond the supported limit {limit}")]
    DiscriminantOutOfRange { discriminant: String, limit: i64 },

    #[error("record '{label}' is malformed: {message}")]
    InvalidRecord { label: String, message: String },

    #[error("invalid field table: {message}")]
    InvalidTable { message: String },

    #[error("field not a number field: {field}")]
    NotANumberField { field: String },

    #[error("backend '{backend}' cannot reduce degree {degree} polynomials")]
    ReductionUnavailable { backend: &'static str, degree: usize },

    #[error("polynomial {polynomial} is reducible over the rationals")]
    Reducible { polynomial: String },

    #[error("deadline exceeded during {stage}")]
    Timeout { stage: &'static str },

    #[error("backend '{backend}' has no entry for {polynomial}")]
    UnknownField {
        backend: &'static str,
        polynomial: String,
    },

    #[error("can only normalize absolute number fields or the rational field, got: {field}")]
    UnsupportedFieldKind { field: String },

    #[error("the zero polynomial does not define a field")]
    ZeroPolynomial,
}

impl FieldError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::BackendContract { .. } => ErrorClass::Internal,
            Self::ConstantPolynomial { .. } | Self::Reducible { .. } | Self::ZeroPolynomial => {
                ErrorClass::InvalidPolynomial
            }
            Self::DiscriminantOutOfRange { .. }
            | Self::ReductionUnavailable { .. }
            | Self::UnknownField { .. } => ErrorClass::ReductionUnavailable,
            Self::InvalidRecord { .. } => ErrorClass::Schema,
            Self::InvalidTable { .. } => ErrorClass::Config,
            Self::NotANumberField { .. } => ErrorClass::NotANumberField,
            Self::Timeout { .. } => ErrorClass::Timeout,
            Self::UnsupportedFieldKind { .. } => ErrorClass::UnsupportedFieldKind,
        }
    }
}

///
/// NumberField
///
/// Absolute number field `Q[x]/(f)` with a named generator.
///

#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    polynomial: Polynomial,
    generator: String,
    embedding: Option<Complex64>,
}

impl NumberField {
    pub fn new(polynomial: Polynomial, generator: impl Into<String>) -> Result<Self, FieldError> {
        if polynomial.degree() == 0 {
            return Err(FieldError::ConstantPolynomial {
                polynomial: polynomial.to_string(),
            });
        }

        Ok(Self {
            polynomial,
            generator: generator.into(),
            embedding: None,
        })
    }

    #[must_use]
    pub const fn with_embedding(mut self, value: Complex64) -> Self {
        self.embedding = Some(value);
        self
    }

    #[must_use]
    pub fn renamed(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    #[must_use]
    pub const fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    #[must_use]
    pub fn generator(&self) -> &str {
        &self.generator
    }

    /// Complex value of the generator, if the field is embedded.
    #[must_use]
    pub const fn embedding(&self) -> Option<Complex64> {
        self.embedding
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        self.polynomial.degree()
    }
}

impl Display for NumberField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number Field in {} with defining polynomial {}",
            self.generator, self.polynomial
        )?;
        if let Some(z) = self.embedding {
            write!(f, " with {} = {}", self.generator, ComplexDisplay(z))?;
        }

        Ok(())
    }
}

struct ComplexDisplay(Complex64);

impl Display for ComplexDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Complex64 { re, im } = self.0;
        if im == 0.0 {
            write!(f, "{re}")
        } else if re == 0.0 {
            write!(f, "{im}*I")
        } else if im < 0.0 {
            write!(f, "{re} - {}*I", -im)
        } else {
            write!(f, "{re} + {im}*I")
        }
    }
}

///
/// RelativeField
///
/// Extension of a number field other than the rationals. Carried so callers
/// can present one; the normalizer rejects it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct RelativeField {
    pub base: Box<Field>,
    pub polynomial: Polynomial,
    pub generator: String,
}

///
/// FiniteField
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FiniteField {
    pub characteristic: u64,
    pub degree: u32,
}

///
/// Field
///
/// Any field a caller can present.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Rational,
    Absolute(NumberField),
    Relative(RelativeField),
    Finite(FiniteField),
}

impl Field {
    /// Absolute number field from integer coefficients (low-to-high).
    pub fn number_field(coeffs: &[i64], generator: &str) -> Result<Self, FieldError> {
        Ok(Self::Absolute(NumberField::new(
            Polynomial::from_i64s(coeffs)?,
            generator,
        )?))
    }

    /// `Q(sqrt(d))` presented by `x^2 - d` with generator `a`.
    pub fn quadratic(d: i64) -> Result<Self, FieldError> {
        Self::number_field(&[-d, 0, 1], CANONICAL_GENERATOR)
    }

    #[must_use]
    pub const fn is_number_field(&self) -> bool {
        matches!(self, Self::Rational | Self::Absolute(_) | Self::Relative(_))
    }

    /// Absolute degree over the rationals, when known.
    #[must_use]
    pub fn degree(&self) -> Option<usize> {
        match self {
            Self::Rational => Some(1),
            Self::Absolute(nf) => Some(nf.degree()),
            Self::Relative(rel) => rel
                .base
                .degree()
                .map(|base| base * rel.polynomial.degree()),
            Self::Finite(_) => None,
        }
    }

    /// Defining polynomial of an absolute field; `x` for the rationals.
    #[must_use]
    pub fn defining_polynomial(&self) -> Option<Polynomial> {
        match self {
            Self::Rational => Some(Polynomial::x()),
            Self::Absolute(nf) => Some(nf.polynomial.clone()),
            Self::Relative(_) | Self::Finite(_) => None,
        }
    }
}

impl From<NumberField> for Field {
    fn from(nf: NumberField) -> Self {
        Self::Absolute(nf)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rational => write!(f, "Rational Field"),
            Self::Absolute(nf) => nf.fmt(f),
            Self::Relative(rel) => write!(
                f,
                "Number Field in {} with defining polynomial {} over its base field",
                rel.generator,
                rel.polynomial.display_in("x")
            ),
            Self::Finite(ff) if ff.degree == 1 => {
                write!(f, "Finite Field of size {}", ff.characteristic)
            }
            Self::Finite(ff) => write!(
                f,
                "Finite Field of size {}^{}",
                ff.characteristic, ff.degree
            ),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_fields_like_sage() {
        assert_eq!(Field::Rational.to_string(), "Rational Field");
        assert_eq!(
            Field::quadratic(-5).unwrap().to_string(),
            "Number Field in a with defining polynomial x^2 + 5"
        );

        let embedded = NumberField::new(Polynomial::from_i64s(&[1, 0, 1]).unwrap(), "i")
            .unwrap()
            .with_embedding(Complex64::new(0.0, -1.0));
        assert_eq!(
            embedded.to_string(),
            "Number Field in i with defining polynomial x^2 + 1 with i = -1*I"
        );
        assert_eq!(
            Field::Finite(FiniteField {
                characteristic: 5,
                degree: 3
            })
            .to_string(),
            "Finite Field of size 5^3"
        );
    }

    #[test]
    fn constant_polynomials_are_rejected() {
        let err = Field::number_field(&[7], "a").unwrap_err();

        assert!(matches!(err, FieldError::ConstantPolynomial { .. }));
        assert_eq!(err.class(), ErrorClass::InvalidPolynomial);
    }

    #[test]
    fn relative_degree_multiplies() {
        let base = Field::quadratic(2).unwrap();
        let rel = Field::Relative(RelativeField {
            base: Box::new(base),
            polynomial: Polynomial::from_i64s(&[-3, 0, 1]).unwrap(),
            generator: "b".to_string(),
        });

        assert_eq!(rel.degree(), Some(4));
        assert!(rel.defining_polynomial().is_none());
        assert!(rel.is_number_field());
    }
}
