use crate::{
    Deadline,
    field::{
        FieldError, FieldInvariants, FieldMap, Polynomial, Signature,
        backend::{FieldBackend, Reduction, forms, sort_roots},
        ratio,
    },
};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_integer::{Integer, Roots};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

///
/// NativeBackend
///
/// Exact reduction and invariants for fields of degree 1 and 2.
/// Higher degrees fail with `ReductionUnavailable`; pair this backend with a
/// [`TableBackend`](super::TableBackend) to register them.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NativeBackend;

impl NativeBackend {
    const NAME: &'static str = "native";

    const fn unavailable(degree: usize) -> FieldError {
        FieldError::ReductionUnavailable {
            backend: Self::NAME,
            degree,
        }
    }
}

impl FieldBackend for NativeBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reduce(&self, poly: &Polynomial, deadline: &Deadline) -> Result<Reduction, FieldError> {
        match poly.degree() {
            0 => Err(FieldError::ConstantPolynomial {
                polynomial: poly.to_string(),
            }),
            1 => reduce_linear(poly),
            2 => Quadratic::analyze(poly, deadline)?.reduction(),
            degree => Err(Self::unavailable(degree)),
        }
    }

    fn invariants(
        &self,
        poly: &Polynomial,
        deadline: &Deadline,
    ) -> Result<FieldInvariants, FieldError> {
        match poly.degree() {
            0 => Err(FieldError::ConstantPolynomial {
                polynomial: poly.to_string(),
            }),
            1 => Ok(FieldInvariants::rational()),
            2 => Quadratic::analyze(poly, deadline)?.invariants(deadline),
            degree => Err(Self::unavailable(degree)),
        }
    }

    fn complex_roots(&self, poly: &Polynomial) -> Result<Vec<Complex64>, FieldError> {
        let c = |i: usize| poly.coefficients()[i].to_f64().unwrap_or(f64::NAN);

        let mut roots = match poly.degree() {
            0 => {
                return Err(FieldError::ConstantPolynomial {
                    polynomial: poly.to_string(),
                });
            }
            1 => vec![Complex64::new(-c(0) / c(1), 0.0)],
            2 => {
                let (a, b, c0) = (c(2), c(1), c(0));
                let delta = b.mul_add(b, -4.0 * a * c0);
                if delta >= 0.0 {
                    let root = delta.sqrt();
                    vec![
                        Complex64::new((-b - root) / (2.0 * a), 0.0),
                        Complex64::new((-b + root) / (2.0 * a), 0.0),
                    ]
                } else {
                    let im = (-delta).sqrt() / (2.0 * a);
                    let re = -b / (2.0 * a);
                    vec![Complex64::new(re, -im), Complex64::new(re, im)]
                }
            }
            degree => return Err(Self::unavailable(degree)),
        };
        sort_roots(&mut roots);

        Ok(roots)
    }
}

fn shape_mismatch(poly: &Polynomial) -> FieldError {
    FieldError::BackendContract {
        backend: NativeBackend::NAME,
        message: format!("unexpected coefficient count for {poly}"),
    }
}

// l*x + n reduces to x; the old generator is the constant -n/l.
fn reduce_linear(poly: &Polynomial) -> Result<Reduction, FieldError> {
    let primitive = poly.primitive_part();
    let [n, l] = primitive.coefficients() else {
        return Err(shape_mismatch(poly));
    };
    let root = BigRational::new(-n.clone(), l.clone());

    Ok(Reduction {
        polynomial: Polynomial::x(),
        map: FieldMap::new(vec![root], Vec::new()),
    })
}

///
/// Quadratic
///
/// A primitive `l*x^2 + m*x + n` with discriminant `f^2 * d`, `d` squarefree.
///

struct Quadratic {
    lead: BigInt,
    linear: BigInt,
    conductor_f: BigInt,
    core: BigInt,
}

impl Quadratic {
    fn analyze(poly: &Polynomial, deadline: &Deadline) -> Result<Self, FieldError> {
        let primitive = poly.primitive_part();
        let [n, m, l] = primitive.coefficients() else {
            return Err(shape_mismatch(poly));
        };
        let delta = m * m - BigInt::from(4) * l * n;

        let (f, core) = square_decomposition(&delta.abs(), deadline)?;
        let core = if delta.is_negative() { -core } else { core };
        if core.is_one() || delta.is_zero() {
            return Err(FieldError::Reducible {
                polynomial: poly.to_string(),
            });
        }

        Ok(Self {
            lead: l.clone(),
            linear: m.clone(),
            conductor_f: f,
            core,
        })
    }

    fn core_is_one_mod_four(&self) -> bool {
        self.core.mod_floor(&BigInt::from(4)).is_one()
    }

    // x^2 - x + (1 - d)/4 when d = 1 mod 4, else x^2 - d.
    fn reduced_polynomial(&self) -> Result<Polynomial, FieldError> {
        let d = &self.core;
        let coeffs = if self.core_is_one_mod_four() {
            vec![(BigInt::one() - d) / 4, -BigInt::one(), BigInt::one()]
        } else {
            vec![-d.clone(), BigInt::zero(), BigInt::one()]
        };

        Polynomial::new(coeffs)
    }

    // With y = l*x a root of y^2 + m*y + l*n, y = (-m + f*sqrt(d))/2.
    fn reduction(&self) -> Result<Reduction, FieldError> {
        let (l, m, f) = (&self.lead, &self.linear, &self.conductor_f);
        let two = BigInt::from(2);

        let (image, inverse) = if self.core_is_one_mod_four() {
            // sqrt(d) = 2a - 1
            (
                vec![ratio(-m - f, &two * l), ratio(f.clone(), l.clone())],
                vec![ratio(m + f, &two * f), ratio(l.clone(), f.clone())],
            )
        } else {
            // sqrt(d) = a
            (
                vec![ratio(-m.clone(), &two * l), ratio(f.clone(), &two * l)],
                vec![ratio(m.clone(), f.clone()), ratio(&two * l, f.clone())],
            )
        };

        Ok(Reduction {
            polynomial: self.reduced_polynomial()?,
            map: FieldMap::new(image, inverse),
        })
    }

    fn fundamental_discriminant(&self) -> BigInt {
        if self.core_is_one_mod_four() {
            self.core.clone()
        } else {
            &self.core * 4
        }
    }

    fn invariants(&self, deadline: &Deadline) -> Result<FieldInvariants, FieldError> {
        let discriminant = self.fundamental_discriminant();
        let signature = if self.core.is_positive() {
            Signature::new(2, 0)
        } else {
            Signature::new(0, 1)
        };

        Ok(FieldInvariants {
            degree: 2,
            signature,
            class_number: forms::class_number(&discriminant, deadline)?,
            conductor: Some(discriminant.abs()),
            discriminant,
        })
    }
}

/// Largest trial divisor [`square_decomposition`] tries.
const TRIAL_DIVISION_LIMIT: u64 = 1 << 20;

/// Split `n > 0` as `f^2 * core` with `core` squarefree.
///
/// Trial division stops at the cube root of the unfactored part: what
/// remains then has at most two prime factors, so it is either squarefree
/// or a prime square. A part left without divisors up to
/// [`TRIAL_DIVISION_LIMIT`] and at least its cube cannot be split this way.
fn square_decomposition(n: &BigInt, deadline: &Deadline) -> Result<(BigInt, BigInt), FieldError> {
    let mut rest = n.clone();
    let mut f = BigInt::one();
    let mut core = BigInt::one();
    let mut pulse = deadline.pulse();
    let mut p = 2u64;

    while BigInt::from(p).pow(3) <= rest {
        if p > TRIAL_DIVISION_LIMIT {
            return Err(FieldError::DiscriminantOutOfRange {
                discriminant: n.to_string(),
                limit: 1 << 60,
            });
        }
        if pulse.tick() {
            return Err(FieldError::Timeout {
                stage: "discriminant factorization",
            });
        }

        let mut exponent = 0u32;
        while (&rest % p).is_zero() {
            rest /= p;
            exponent += 1;
        }
        if exponent > 0 {
            f *= BigInt::from(p).pow(exponent / 2);
            if exponent % 2 == 1 {
                core *= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }

    if rest > BigInt::one() {
        let root = rest.sqrt();
        if &root * &root == rest {
            f *= root;
        } else {
            core *= rest;
        }
    }

    Ok((f, core))
}

///
/// TESTS
///
