use crate::field::Polynomial;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

///
/// FieldMap
///
/// Isomorphism between two presentations of one field.
///
/// `image` is the source generator written as a rational polynomial in the
/// target generator; `inverse` is the target generator written in the source
/// generator. Both are low-to-high coefficient lists.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldMap {
    #[serde(with = "crate::serialize::decimal::rational_vec")]
    image: Vec<BigRational>,
    #[serde(with = "crate::serialize::decimal::rational_vec")]
    inverse: Vec<BigRational>,
}

impl FieldMap {
    #[must_use]
    pub fn new(image: Vec<BigRational>, inverse: Vec<BigRational>) -> Self {
        Self {
            image: trim(image),
            inverse: trim(inverse),
        }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::new(generator(), generator())
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.image == generator() && self.inverse == generator()
    }

    #[must_use]
    pub fn image(&self) -> &[BigRational] {
        &self.image
    }

    #[must_use]
    pub fn inverse(&self) -> &[BigRational] {
        &self.inverse
    }

    /// Value of the target generator under an embedding that sends the
    /// source generator to `source_value`.
    #[must_use]
    pub fn transport(&self, source_value: Complex64) -> Complex64 {
        self.inverse
            .iter()
            .rev()
            .fold(Complex64::new(0.0, 0.0), |acc, c| {
                acc * source_value + Complex64::new(c.to_f64().unwrap_or(f64::NAN), 0.0)
            })
    }

    /// Whether both directions send roots to roots:
    /// `source(image(a)) = 0 mod target` and `target(inverse(t)) = 0 mod source`.
    #[must_use]
    pub fn verify(&self, source: &Polynomial, target: &Polynomial) -> bool {
        let source_q = to_rational(source);
        let target_q = to_rational(target);

        compose_mod(&source_q, &self.image, &target_q).is_empty()
            && compose_mod(&target_q, &self.inverse, &source_q).is_empty()
    }
}

fn generator() -> Vec<BigRational> {
    vec![BigRational::zero(), BigRational::one()]
}

fn trim(mut coeffs: Vec<BigRational>) -> Vec<BigRational> {
    while coeffs.last().is_some_and(Zero::is_zero) {
        coeffs.pop();
    }
    coeffs
}

fn to_rational(poly: &Polynomial) -> Vec<BigRational> {
    poly.coefficients()
        .iter()
        .map(|c| BigRational::from_integer(c.clone()))
        .collect()
}

fn mul(a: &[BigRational], b: &[BigRational]) -> Vec<BigRational> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![BigRational::zero(); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }

    trim(out)
}

fn add_constant(mut a: Vec<BigRational>, c: &BigRational) -> Vec<BigRational> {
    if a.is_empty() {
        a.push(BigRational::zero());
    }
    a[0] += c;

    trim(a)
}

// Remainder of `a` modulo a non-zero `m`.
fn rem(mut a: Vec<BigRational>, m: &[BigRational]) -> Vec<BigRational> {
    let Some(lead) = m.last() else {
        return a;
    };
    let shift_base = m.len() - 1;

    while a.len() > shift_base {
        let Some(top) = a.last().cloned() else {
            break;
        };
        let factor = top / lead;
        let shift = a.len() - m.len();
        for (i, c) in m.iter().enumerate() {
            a[shift + i] -= &factor * c;
        }
        a.pop();
        a = trim(a);
    }

    a
}

// outer(inner) reduced modulo `m`, Horner style.
fn compose_mod(
    outer: &[BigRational],
    inner: &[BigRational],
    m: &[BigRational],
) -> Vec<BigRational> {
    let inner = rem(inner.to_vec(), m);

    outer.iter().rev().fold(Vec::new(), |acc, c| {
        rem(add_constant(mul(&acc, &inner), c), m)
    })
}

/// Shorthand for building rationals in backends and tests.
pub(crate) fn ratio(numer: impl Into<BigInt>, denom: impl Into<BigInt>) -> BigRational {
    BigRational::new(numer.into(), denom.into())
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
    fn identity_verifies_against_itself() {
        let p = poly(&[-2, 0, 1]);

        assert!(FieldMap::identity().verify(&p, &p));
        assert!(FieldMap::identity().is_identity());
    }

    #[test]
    fn scaling_map_between_sqrt8_and_sqrt2() {
        // x^2 - 8 -> a^2 - 2 with x = 2a and a = x/2.
        let map = FieldMap::new(
            vec![ratio(0, 1), ratio(2, 1)],
            vec![ratio(0, 1), ratio(1, 2)],
        );

        assert!(map.verify(&poly(&[-8, 0, 1]), &poly(&[-2, 0, 1])));
        assert!(!map.verify(&poly(&[-8, 0, 1]), &poly(&[-3, 0, 1])));
    }

    #[test]
    fn transport_moves_embeddings_through_the_inverse() {
        let map = FieldMap::new(
            vec![ratio(0, 1), ratio(2, 1)],
            vec![ratio(0, 1), ratio(1, 2)],
        );
        let value = map.transport(Complex64::new(8f64.sqrt(), 0.0));

        assert!((value.re - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn negation_map_between_cubic_presentations() {
        // x^3 - 21x + 28 at x = -a is -(a^3 - 21a - 28).
        let map = FieldMap::new(vec![ratio(0, 1), ratio(-1, 1)], vec![ratio(0, 1), ratio(-1, 1)]);

        assert!(map.verify(&poly(&[28, -21, 0, 1]), &poly(&[-28, -21, 0, 1])));
    }
}
