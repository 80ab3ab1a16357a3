//! Class numbers of quadratic fields from binary quadratic forms.
//!
//! Definite discriminants count reduced primitive forms. Indefinite
//! discriminants count ρ-cycles of reduced forms (the narrow class group)
//! and then identify each cycle with its image under `(a, b, c) -> (-a, b, -c)`,
//! which yields the wide class number.
//!
//! Both counts take time linear in |D|, so the discriminant is bounded and
//! the loops poll the caller's deadline.

use crate::{Deadline, deadline::Pulse, field::FieldError};
use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// Largest |D| handled for imaginary quadratic fields.
pub(super) const DEFINITE_LIMIT: i64 = 1 << 27;

/// Largest D handled for real quadratic fields.
pub(super) const INDEFINITE_LIMIT: i64 = 1 << 26;

type Form = (i64, i64, i64);

/// Class number of the quadratic field with fundamental discriminant `d`.
pub(super) fn class_number(d: &BigInt, deadline: &Deadline) -> Result<u64, FieldError> {
    let out_of_range = |limit| FieldError::DiscriminantOutOfRange {
        discriminant: d.to_string(),
        limit,
    };

    let disc = d.to_i64().ok_or_else(|| out_of_range(DEFINITE_LIMIT))?;
    if disc < 0 {
        if -disc > DEFINITE_LIMIT {
            return Err(out_of_range(DEFINITE_LIMIT));
        }
        definite(disc, &mut deadline.pulse())
    } else {
        if disc > INDEFINITE_LIMIT {
            return Err(out_of_range(INDEFINITE_LIMIT));
        }
        indefinite(disc, &mut deadline.pulse())
    }
}

fn gcd3(a: i64, b: i64, c: i64) -> i64 {
    a.gcd(&b).gcd(&c)
}

fn beat(pulse: &mut Pulse<'_>) -> Result<(), FieldError> {
    if pulse.tick() {
        Err(FieldError::Timeout {
            stage: "class number computation",
        })
    } else {
        Ok(())
    }
}

// |b| <= a <= c, with b >= 0 whenever |b| = a or a = c.
fn definite(d: i64, pulse: &mut Pulse<'_>) -> Result<u64, FieldError> {
    let n = -d;
    let mut count = 0;
    let mut a = 1i64;

    while 3 * a * a <= n {
        for b in (1 - a)..=a {
            beat(pulse)?;
            if (b - d).rem_euclid(2) != 0 {
                continue;
            }
            let numer = b * b - d;
            if numer % (4 * a) != 0 {
                continue;
            }
            let c = numer / (4 * a);
            if c < a || (a == c && b < 0) {
                continue;
            }
            if gcd3(a, b, c) == 1 {
                count += 1;
            }
        }
        a += 1;
    }

    Ok(count)
}

// Reduced: 0 < b < sqrt(D) and sqrt(D) - b < 2|a| < sqrt(D) + b. Since D is
// not a square these are exact on s = floor(sqrt(D)).
fn reduced_indefinite(d: i64, s: i64, pulse: &mut Pulse<'_>) -> Result<Vec<Form>, FieldError> {
    let mut forms = Vec::new();

    for b in 1..=s {
        if (b - d).rem_euclid(2) != 0 {
            continue;
        }
        let n = (d - b * b) / 4;
        for abs_a in ((s - b) / 2 + 1)..=((s + b) / 2) {
            beat(pulse)?;
            if n % abs_a != 0 {
                continue;
            }
            let abs_c = n / abs_a;
            if gcd3(abs_a, b, abs_c) != 1 {
                continue;
            }
            forms.push((abs_a, b, -abs_c));
            forms.push((-abs_a, b, abs_c));
        }
    }

    Ok(forms)
}

fn rho(form: Form, d: i64, s: i64) -> Form {
    let (_, b, c) = form;
    let m = 2 * c.abs();
    let r = (-b).rem_euclid(m);
    let next_b = s - (s - r).rem_euclid(m);
    let next_c = (next_b * next_b - d) / (4 * c);

    (c, next_b, next_c)
}

fn indefinite(d: i64, pulse: &mut Pulse<'_>) -> Result<u64, FieldError> {
    let s = d.sqrt();
    let forms = reduced_indefinite(d, s, pulse)?;
    let mut cycle_of = BTreeMap::<Form, usize>::new();
    let mut representatives = Vec::new();

    for &start in &forms {
        if cycle_of.contains_key(&start) {
            continue;
        }
        let id = representatives.len();
        representatives.push(start);

        let mut current = start;
        for _ in 0..=forms.len() {
            beat(pulse)?;
            cycle_of.insert(current, id);
            current = rho(current, d, s);
            if current == start {
                break;
            }
        }
        if current != start {
            return Err(FieldError::BackendContract {
                backend: "native",
                message: format!("reduction cycle did not close for discriminant {d}"),
            });
        }
    }

    let mut wide = 0;
    for (id, &(a, b, c)) in representatives.iter().enumerate() {
        let partner = cycle_of.get(&(-a, b, -c)).copied().ok_or_else(|| {
            FieldError::BackendContract {
                backend: "native",
                message: format!("form ({}, {b}, {}) is not reduced for {d}", -a, -c),
            }
        })?;
        if partner >= id {
            wide += 1;
        }
    }

    Ok(wide)
}

///
/// TESTS
///
