//! External label catalogs.
//!
//! A catalog answers two read-only questions: which label an external
//! reference database assigns to a canonical field, and which field stands
//! behind a label. Answers are advisory; the local store stays the only
//! arbiter of uniqueness.

mod lmfdb;

pub use lmfdb::LmfdbCatalog;

use crate::{
    Error,
    error::ErrorClass,
    field::{CANONICAL_GENERATOR, Field, FieldError, NumberField, Polynomial},
};
use num_bigint::BigInt;
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error as ThisError;

///
/// CatalogError
///

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("catalog response from '{url}' is malformed: {message}")]
    Malformed { url: String, message: String },

    #[error("catalog request to '{url}' failed: {message}")]
    Request { url: String, message: String },

    #[error("catalog returned HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    #[error("catalog request to '{url}' timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u128 },

    #[error("catalog '{catalog}' is unreachable")]
    Unreachable { catalog: &'static str },
}

impl CatalogError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout { .. } => ErrorClass::Timeout,
            Self::Malformed { .. }
            | Self::Request { .. }
            | Self::Status { .. }
            | Self::Unreachable { .. } => ErrorClass::ExternalLookupFailed,
        }
    }
}

///
/// LabelResolver
///
/// Read-only lookup against an external catalog. "No match" is `Ok(None)`;
/// transport and parse failures are errors and are never retried here.
///

pub trait LabelResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Label of a canonical field, matched on its exact coefficients.
    fn resolve_label(&self, field: &Field, timeout: Duration) -> Result<Option<String>, Error>;

    /// Field behind a label.
    fn resolve_field(&self, label: &str, timeout: Duration) -> Result<Option<Field>, Error>;
}

/// Coefficients a catalog is queried with. The rational field is `x`.
pub(crate) fn query_coefficients(field: &Field) -> Result<Vec<BigInt>, FieldError> {
    field
        .defining_polynomial()
        .map(Polynomial::into_coefficients)
        .ok_or_else(|| FieldError::UnsupportedFieldKind {
            field: field.to_string(),
        })
}

/// Field for coefficients returned by a catalog. `[0, 1]` is the rational
/// field.
pub(crate) fn field_from_coefficients(coeffs: Vec<BigInt>) -> Result<Field, FieldError> {
    let poly = Polynomial::new(coeffs)?;
    if poly == Polynomial::x() {
        return Ok(Field::Rational);
    }

    Ok(NumberField::new(poly, CANONICAL_GENERATOR)?.into())
}

///
/// StaticCatalog
///
/// In-memory catalog for offline runs and tests.
///

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    by_coefficients: BTreeMap<Vec<BigInt>, String>,
    by_label: BTreeMap<String, Vec<BigInt>>,
    unreachable: bool,
}

impl StaticCatalog {
    const NAME: &'static str = "static";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose every lookup fails, as a dead network would.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with(mut self, label: &str, coeffs: &[i64]) -> Self {
        let coeffs: Vec<BigInt> = coeffs.iter().copied().map(BigInt::from).collect();
        self.by_coefficients
            .insert(coeffs.clone(), label.to_string());
        self.by_label.insert(label.to_string(), coeffs);
        self
    }

    fn reachable(&self) -> Result<(), CatalogError> {
        if self.unreachable {
            Err(CatalogError::Unreachable {
                catalog: Self::NAME,
            })
        } else {
            Ok(())
        }
    }
}

impl LabelResolver for StaticCatalog {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn resolve_label(&self, field: &Field, _timeout: Duration) -> Result<Option<String>, Error> {
        self.reachable()?;
        let coeffs = query_coefficients(field)?;

        Ok(self.by_coefficients.get(&coeffs).cloned())
    }

    fn resolve_field(&self, label: &str, _timeout: Duration) -> Result<Option<Field>, Error> {
        self.reachable()?;

        self.by_label
            .get(label)
            .map(|coeffs| field_from_coefficients(coeffs.clone()))
            .transpose()
            .map_err(Error::from)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn static_catalog_resolves_both_ways() {
        let catalog = StaticCatalog::new()
            .with("1.1.1.1", &[0, 1])
            .with("2.2.8.1", &[-2, 0, 1]);

        let sqrt2 = Field::number_field(&[-2, 0, 1], "a").unwrap();
        assert_eq!(
            catalog.resolve_label(&sqrt2, T).unwrap().as_deref(),
            Some("2.2.8.1")
        );
        assert_eq!(
            catalog.resolve_label(&Field::Rational, T).unwrap().as_deref(),
            Some("1.1.1.1")
        );
        assert_eq!(catalog.resolve_field("2.2.8.1", T).unwrap(), Some(sqrt2));
        assert_eq!(
            catalog.resolve_field("1.1.1.1", T).unwrap(),
            Some(Field::Rational)
        );
    }

    #[test]
    fn misses_are_not_errors() {
        let catalog = StaticCatalog::new();

        let sqrt3 = Field::quadratic(3).unwrap();
        assert_eq!(catalog.resolve_label(&sqrt3, T).unwrap(), None);
        assert_eq!(catalog.resolve_field("2.2.12.1", T).unwrap(), None);
    }

    #[test]
    fn failures_propagate() {
        let err = StaticCatalog::unreachable()
            .resolve_label(&Field::Rational, T)
            .unwrap_err();

        assert_eq!(err.class, ErrorClass::ExternalLookupFailed);
    }

    #[test]
    fn timeouts_have_their_own_class() {
        let err = CatalogError::Timeout {
            url: "http://catalog.invalid".to_string(),
            timeout_ms: 5,
        };

        assert_eq!(Error::from(err).class, ErrorClass::Timeout);
    }
}
