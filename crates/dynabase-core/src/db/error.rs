use crate::{db::schema::SchemaError, error::ErrorClass};
use rusqlite::{ErrorCode, ffi};
use thiserror::Error as ThisError;

///
/// StoreError
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("database is busy: {message}")]
    Busy { message: String },

    #[error("check constraint failed: {message}")]
    CheckViolation { message: String },

    #[error("store is corrupt: {message}")]
    Corrupt { message: String },

    #[error("database error: {message}")]
    Driver { message: String },

    #[error("insert or update violates foreign key: {message}")]
    ForeignKeyViolation { message: String },

    #[error("{count} rows in '{table}' match {column} = {value}; expected at most one")]
    MultipleRows {
        table: String,
        column: String,
        value: String,
        count: usize,
    },

    #[error("no row in '{table}' matches {column} = {value}")]
    NoRows {
        table: String,
        column: String,
        value: String,
    },

    #[error("column '{column}' of '{table}' does not accept NULL")]
    NotNull { table: String, column: String },

    #[error("delete on '{table}' violates foreign key: {value} is still referenced")]
    RestrictViolation { table: String, value: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("duplicate key on '{table}' violates unique constraint '{constraint}'")]
    UniqueViolation {
        table: String,
        constraint: String,
        columns: Vec<String>,
    },
}

impl StoreError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Busy { .. } => ErrorClass::Timeout,
            Self::CheckViolation { .. } | Self::NotNull { .. } | Self::Schema(_) => {
                ErrorClass::Schema
            }
            Self::Corrupt { .. } | Self::MultipleRows { .. } => ErrorClass::IntegrityViolation,
            Self::Driver { .. } => ErrorClass::Internal,
            Self::ForeignKeyViolation { .. } | Self::NoRows { .. } => ErrorClass::NotFound,
            Self::RestrictViolation { .. } => ErrorClass::FieldInUse,
            Self::UniqueViolation { .. } => ErrorClass::DuplicateField,
        }
    }

    /// Name of the violated constraint, for unique violations.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::UniqueViolation { constraint, .. } => Some(constraint),
            _ => None,
        }
    }

    /// True for a unique violation on exactly `columns` of `table`.
    #[must_use]
    pub fn violates_unique(&self, table: &str, columns: &[&str]) -> bool {
        matches!(
            self,
            Self::UniqueViolation { table: t, columns: c, .. }
                if t == table && c.iter().map(String::as_str).eq(columns.iter().copied())
        )
    }

    /// Classify an error reported by SQLite.
    #[must_use]
    pub fn from_driver(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let message = message.clone().unwrap_or_else(|| failure.to_string());

                match failure.code {
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => Self::Busy { message },
                    ErrorCode::ConstraintViolation => {
                        constraint_violation(failure.extended_code, message)
                    }
                    _ => match message.strip_prefix("no such table: ") {
                        Some(table) => SchemaError::MissingRelation(table.to_string()).into(),
                        None => Self::Driver { message },
                    },
                }
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::Utf8Error(_) => Self::Corrupt {
                message: err.to_string(),
            },
            _ => Self::Driver {
                message: err.to_string(),
            },
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from_driver(err)
    }
}

// SQLite reports `UNIQUE constraint failed: t.a, t.b` and
// `NOT NULL constraint failed: t.a`.
fn constraint_violation(extended_code: i32, message: String) -> StoreError {
    match extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            let (table, columns) = failed_columns(&message);
            let constraint = if extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
                format!("{table}_pkey")
            } else {
                format!("{table}_{}_key", columns.join("_"))
            };

            StoreError::UniqueViolation {
                table,
                constraint,
                columns,
            }
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ForeignKeyViolation { message },
        ffi::SQLITE_CONSTRAINT_NOTNULL => {
            let (table, mut columns) = failed_columns(&message);

            StoreError::NotNull {
                table,
                column: columns.pop().unwrap_or_default(),
            }
        }
        _ => StoreError::CheckViolation { message },
    }
}

fn failed_columns(message: &str) -> (String, Vec<String>) {
    let list = message
        .split_once("failed: ")
        .map_or(message, |(_, rest)| rest);

    let mut table = String::new();
    let columns = list
        .split(", ")
        .filter_map(|qualified| {
            let (t, column) = qualified.trim().split_once('.')?;
            table = t.to_string();
            Some(column.to_string())
        })
        .collect();

    (table, columns)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some(message.to_string()),
        )
    }

    #[test]
    fn unique_violations_name_their_constraint() {
        let pk = StoreError::from_driver(failure(
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
            "UNIQUE constraint failed: number_fields.label",
        ));
        assert_eq!(pk.constraint(), Some("number_fields_pkey"));
        assert!(pk.violates_unique("number_fields", &["label"]));

        let coeffs = StoreError::from_driver(failure(
            ffi::SQLITE_CONSTRAINT_UNIQUE,
            "UNIQUE constraint failed: number_fields.defn_poly_coeffs",
        ));
        assert_eq!(
            coeffs.constraint(),
            Some("number_fields_defn_poly_coeffs_key")
        );
        assert!(!coeffs.violates_unique("number_fields", &["label"]));
        assert_eq!(coeffs.class(), ErrorClass::DuplicateField);
    }

    #[test]
    fn driver_conditions_map_to_classes() {
        let cases = [
            (failure(ffi::SQLITE_BUSY, "database is locked"), ErrorClass::Timeout),
            (
                failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed"),
                ErrorClass::NotFound,
            ),
            (
                failure(
                    ffi::SQLITE_CONSTRAINT_NOTNULL,
                    "NOT NULL constraint failed: number_fields.degree",
                ),
                ErrorClass::Schema,
            ),
            (
                failure(ffi::SQLITE_CONSTRAINT_CHECK, "CHECK constraint failed: label"),
                ErrorClass::Schema,
            ),
            (
                failure(ffi::SQLITE_ERROR, "no such table: number_fields"),
                ErrorClass::Schema,
            ),
            (rusqlite::Error::InvalidQuery, ErrorClass::Internal),
        ];

        for (err, class) in cases {
            let text = err.to_string();
            assert_eq!(StoreError::from_driver(err).class(), class, "{text}");
        }
    }

    #[test]
    fn missing_tables_become_schema_errors() {
        let err = StoreError::from_driver(failure(ffi::SQLITE_ERROR, "no such table: label_ordinals"));

        assert!(matches!(
            err,
            StoreError::Schema(SchemaError::MissingRelation(ref t)) if t == "label_ordinals"
        ));
    }
}
