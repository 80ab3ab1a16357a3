use crate::{
    field::FieldError,
    serialize::decimal::Decimal,
};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// Polynomial
///
/// Dense integer polynomial, coefficients low-to-high.
/// Never the zero polynomial; the leading coefficient is always non-zero.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "Vec<Decimal>", into = "Vec<Decimal>")]
pub struct Polynomial {
    coeffs: Vec<BigInt>,
}

impl Polynomial {
    /// Build a polynomial from low-to-high coefficients, trimming high zeros.
    pub fn new(mut coeffs: Vec<BigInt>) -> Result<Self, FieldError> {
        while coeffs.last().is_some_and(Zero::is_zero) {
            coeffs.pop();
        }
        if coeffs.is_empty() {
            return Err(FieldError::ZeroPolynomial);
        }

        Ok(Self { coeffs })
    }

    pub fn from_i64s(coeffs: &[i64]) -> Result<Self, FieldError> {
        Self::new(coeffs.iter().copied().map(BigInt::from).collect())
    }

    /// The polynomial `x`, defining polynomial of the rational field.
    #[must_use]
    pub fn x() -> Self {
        Self {
            coeffs: vec![BigInt::zero(), BigInt::one()],
        }
    }

    #[must_use]
    pub fn coefficients(&self) -> &[BigInt] {
        &self.coeffs
    }

    #[must_use]
    pub fn into_coefficients(self) -> Vec<BigInt> {
        self.coeffs
    }

    #[must_use]
    pub const fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    #[must_use]
    pub fn leading(&self) -> &BigInt {
        // Non-empty by construction.
        &self.coeffs[self.coeffs.len() - 1]
    }

    #[must_use]
    pub fn is_monic(&self) -> bool {
        self.leading().is_one()
    }

    /// Positive gcd of all coefficients.
    #[must_use]
    pub fn content(&self) -> BigInt {
        self.coeffs
            .iter()
            .fold(BigInt::zero(), |acc, c| acc.gcd(c))
    }

    /// Divide out the content and make the leading coefficient positive.
    /// The roots are unchanged.
    #[must_use]
    pub fn primitive_part(&self) -> Self {
        let mut content = self.content();
        if self.leading().is_negative() {
            content = -content;
        }

        Self {
            coeffs: self.coeffs.iter().map(|c| c / &content).collect(),
        }
    }

    /// Monic integral polynomial whose roots are `lead * root` of the
    /// primitive part. Returns the polynomial and the scale `lead`.
    #[must_use]
    pub fn monic_integral(&self) -> (Self, BigInt) {
        let primitive = self.primitive_part();
        let lead = primitive.leading().clone();
        let n = primitive.degree();

        let mut scale = BigInt::one();
        let mut coeffs = vec![BigInt::zero(); n + 1];
        for i in (0..n).rev() {
            coeffs[i] = &primitive.coeffs[i] * &scale;
            scale *= &lead;
        }
        coeffs[n] = BigInt::one();

        (Self { coeffs }, lead)
    }

    /// Evaluate at a complex point (Horner, double precision).
    #[must_use]
    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        self.coeffs.iter().rev().fold(Complex64::new(0.0, 0.0), |acc, c| {
            acc * z + Complex64::new(c.to_f64().unwrap_or(f64::NAN), 0.0)
        })
    }

    /// Render with an explicit variable name.
    #[must_use]
    pub const fn display_in<'a>(&'a self, var: &'a str) -> PolynomialDisplay<'a> {
        PolynomialDisplay { poly: self, var }
    }
}

impl Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_in("x").fmt(f)
    }
}

impl TryFrom<Vec<Decimal>> for Polynomial {
    type Error = FieldError;

    fn try_from(raw: Vec<Decimal>) -> Result<Self, Self::Error> {
        Self::new(raw.into_iter().map(|d| d.0).collect())
    }
}

impl From<Polynomial> for Vec<Decimal> {
    fn from(poly: Polynomial) -> Self {
        poly.coeffs.into_iter().map(Decimal).collect()
    }
}

///
/// PolynomialDisplay
///
/// Sage-style rendering: `x^3 - 21*x - 28`.
///

pub struct PolynomialDisplay<'a> {
    poly: &'a Polynomial,
    var: &'a str,
}

impl Display for PolynomialDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (power, coeff) in self.poly.coeffs.iter().enumerate().rev() {
            if coeff.is_zero() {
                continue;
            }

            let magnitude = coeff.abs();
            if first {
                if coeff.is_negative() {
                    write!(f, "-")?;
                }
            } else if coeff.is_negative() {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            first = false;

            match (power, magnitude.is_one()) {
                (0, _) => write!(f, "{magnitude}")?,
                (1, true) => write!(f, "{}", self.var)?,
                (1, false) => write!(f, "{magnitude}*{}", self.var)?,
                (_, true) => write!(f, "{}^{power}", self.var)?,
                (_, false) => write!(f, "{magnitude}*{}^{power}", self.var)?,
            }
        }

        if first {
            write!(f, "0")?;
        }

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(coeffs: &[i64]) -> Polynomial {
        Polynomial::from_i64s(coeffs).unwrap()
    }

    #[test]
    fn trims_high_zeros_and_rejects_zero() {
        assert_eq!(poly(&[-2, 0, 1, 0, 0]).degree(), 2);
        assert!(matches!(
            Polynomial::from_i64s(&[0, 0]),
            Err(FieldError::ZeroPolynomial)
        ));
    }

    #[test]
    fn displays_like_sage() {
        assert_eq!(poly(&[-28, -21, 0, 1]).to_string(), "x^3 - 21*x - 28");
        assert_eq!(poly(&[1, -1, 1]).display_in("a").to_string(), "a^2 - a + 1");
        assert_eq!(poly(&[3, -2]).to_string(), "-2*x + 3");
        assert_eq!(Polynomial::x().to_string(), "x");
    }

    #[test]
    fn monic_integral_scales_roots_by_leading_coefficient() {
        // 6x^2 + 4x - 2 = 2(3x^2 + 2x - 1); roots 1/3 and -1.
        let (monic, lead) = poly(&[-2, 4, 6]).monic_integral();

        assert_eq!(lead, BigInt::from(3));
        // y = 3x: y^2 + 2y - 3
        assert_eq!(monic, poly(&[-3, 2, 1]));
    }

    #[test]
    fn primitive_part_normalizes_sign() {
        assert_eq!(poly(&[8, 0, -4]).primitive_part(), poly(&[-2, 0, 1]));
    }

    #[test]
    fn evaluates_at_complex_points() {
        let value = poly(&[1, 0, 1]).eval_complex(Complex64::new(0.0, 1.0));

        assert!(value.norm() < 1e-12);
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let p = poly(&[-35, -21, 0, 1]);
        let json = serde_json::to_string(&p).unwrap();

        assert_eq!(json, r#"["-35","-21","0","1"]"#);
        assert_eq!(serde_json::from_str::<Polynomial>("[-35, -21, 0, 1]").unwrap(), p);
        assert!(serde_json::from_str::<Polynomial>("[0]").is_err());
    }
}
