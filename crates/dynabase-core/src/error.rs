use crate::{
    catalog::CatalogError,
    config::ConfigError,
    db::{StoreError, schema::SchemaError},
    field::FieldError,
    label::LabelError,
    serialize::SerializeError,
};
use derive_more::Display;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured error returned by every public operation.
/// `class` is the stable taxonomy callers branch on; `detail` keeps the
/// subsystem error that produced it so the offending field, label, or prefix
/// is never lost.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    /// Construct an error without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(detail),
        }
    }

    /// Construct a registry-origin timeout naming the stage that ran out of time.
    pub(crate) fn timeout(stage: &str) -> Self {
        Self::new(
            ErrorClass::Timeout,
            ErrorOrigin::Registry,
            format!("deadline exceeded during {stage}"),
        )
    }

    /// Construct the error raised when auto-normalization was forbidden.
    pub(crate) fn not_normalized(field: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::NotNormalized,
            ErrorOrigin::Registry,
            format!("field not normalized: {field}"),
        )
    }

    /// Construct an internal error for a broken in-process invariant.
    pub(crate) fn internal(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.class
    }

    #[must_use]
    pub fn is(&self, class: ErrorClass) -> bool {
        self.class == class
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Catalog(CatalogError),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Field(FieldError),
    #[error("{0}")]
    Label(LabelError),
    #[error("{0}")]
    Schema(SchemaError),
    #[error("{0}")]
    Serialize(SerializeError),
    #[error("{0}")]
    Store(StoreError),
}

impl From<CatalogError> for Error {
    fn from(err: CatalogError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Catalog, ErrorDetail::Catalog(err))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(
            ConfigError::class(),
            ErrorOrigin::Config,
            ErrorDetail::Config(err),
        )
    }
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Field, ErrorDetail::Field(err))
    }
}

impl From<LabelError> for Error {
    fn from(err: LabelError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Label, ErrorDetail::Label(err))
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::with_detail(
            SchemaError::class(),
            ErrorOrigin::Schema,
            ErrorDetail::Schema(err),
        )
    }
}

impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        Self::with_detail(
            SerializeError::class(),
            ErrorOrigin::Serialize,
            ErrorDetail::Serialize(err),
        )
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Store, ErrorDetail::Store(err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::from_driver(err).into()
    }
}

///
/// ErrorClass
///
/// Caller-facing failure taxonomy.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    #[display("config")]
    Config,
    #[display("duplicate_field")]
    DuplicateField,
    #[display("external_lookup_failed")]
    ExternalLookupFailed,
    #[display("field_in_use")]
    FieldInUse,
    #[display("integrity_violation")]
    IntegrityViolation,
    #[display("internal")]
    Internal,
    #[display("invalid_label")]
    InvalidLabel,
    #[display("invalid_polynomial")]
    InvalidPolynomial,
    #[display("not_a_number_field")]
    NotANumberField,
    #[display("not_found")]
    NotFound,
    #[display("not_normalized")]
    NotNormalized,
    #[display("reduction_unavailable")]
    ReductionUnavailable,
    #[display("schema")]
    Schema,
    #[display("timeout")]
    Timeout,
    #[display("unsupported_field_kind")]
    UnsupportedFieldKind,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    #[display("catalog")]
    Catalog,
    #[display("config")]
    Config,
    #[display("field")]
    Field,
    #[display("label")]
    Label,
    #[display("registry")]
    Registry,
    #[display("schema")]
    Schema,
    #[display("serialize")]
    Serialize,
    #[display("store")]
    Store,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_includes_origin_and_class() {
        let err = Error::timeout("label allocation");

        assert_eq!(
            err.display_with_class(),
            "registry:timeout: deadline exceeded during label allocation"
        );
        assert!(err.is(ErrorClass::Timeout));
    }

    #[test]
    fn field_errors_keep_their_detail() {
        let err = Error::from(FieldError::ZeroPolynomial);

        assert_eq!(err.class, ErrorClass::InvalidPolynomial);
        assert_eq!(err.origin, ErrorOrigin::Field);
        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Field(FieldError::ZeroPolynomial))
        ));
    }
}
