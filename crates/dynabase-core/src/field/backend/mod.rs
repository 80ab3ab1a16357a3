//! Reduction backends.
//!
//! A backend supplies the polynomial-reduction capability the normalizer
//! depends on, plus the arithmetic invariants used for labeling. Any
//! computational-algebra engine can sit behind [`FieldBackend`]; two are
//! provided here.

mod forms;
mod native;
mod table;

pub use native::NativeBackend;
pub use table::{TableAlias, TableBackend, TableDocument, TableField};

use crate::{
    Deadline,
    field::{FieldError, FieldInvariants, FieldMap, Polynomial},
};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// Reduction
///
/// Reduced defining polynomial plus the isomorphism from the input
/// presentation into it.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Reduction {
    pub polynomial: Polynomial,
    pub map: FieldMap,
}

impl Reduction {
    #[must_use]
    pub fn identity(polynomial: Polynomial) -> Self {
        Self {
            polynomial,
            map: FieldMap::identity(),
        }
    }
}

///
/// FieldBackend
///
/// Contract:
/// - `reduce` maps an irreducible integer polynomial to the monic integer
///   polynomial of minimal size generating an isomorphic field, and is a
///   fixed point on its own output.
/// - `reduce` and `invariants` poll `deadline` inside any loop whose length
///   grows with the input, failing with [`FieldError::Timeout`] once it has
///   passed.
/// - `complex_roots` orders roots by (real, imaginary) part; the first root
///   is the default embedding.
///

pub trait FieldBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn reduce(&self, poly: &Polynomial, deadline: &Deadline) -> Result<Reduction, FieldError>;

    fn invariants(
        &self,
        poly: &Polynomial,
        deadline: &Deadline,
    ) -> Result<FieldInvariants, FieldError>;

    fn complex_roots(&self, poly: &Polynomial) -> Result<Vec<Complex64>, FieldError>;
}

/// Order roots by real part, then imaginary part.
pub(crate) fn sort_roots(roots: &mut [Complex64]) {
    roots.sort_by(|a, b| match a.re.total_cmp(&b.re) {
        Ordering::Equal => a.im.total_cmp(&b.im),
        other => other,
    });
}
