//! Number field records and the `number_fields` relation.
//!
//! Connection-level functions take a `&Connection` or a `&Transaction` so a
//! caller can compose them inside one transaction; [`FieldRepository`] wraps
//! each in its own transaction for standalone use.

use crate::{
    Error,
    db::{
        Db, StoreError,
        schema::{FIELD_LABEL_LENGTH, LABEL_ORDINALS, NUMBER_FIELDS},
        statement::{Insert, escape_like},
        value::{IntArray, Numeric, Point},
    },
    error::ErrorDetail,
    field::{FieldError, FieldInvariants, Polynomial, Signature},
    label::{Label, LabelError, LabelPrefix, allocate_label},
    serialize::decimal,
};
use num_bigint::BigInt;
use num_traits::{One, Signed};
use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, params,
    types::{Type, Value},
};
use serde::{Deserialize, Serialize};

/// Column order every record query selects.
const RECORD_COLUMNS: &str =
    "label, degree, defn_poly_coeffs, signature, conductor, class_number, discriminant";

/// Primary-key constraint on `number_fields.label`.
pub const LABEL_CONSTRAINT: &str = "number_fields_pkey";

/// Unique constraint on `number_fields.defn_poly_coeffs`.
pub const COEFFICIENTS_CONSTRAINT: &str = "number_fields_defn_poly_coeffs_key";

///
/// NumberFieldRecord
///
/// One row of `number_fields`. Immutable once stored.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NumberFieldRecord {
    pub label: String,
    pub degree: u32,
    #[serde(with = "decimal::vec")]
    pub coefficients: Vec<BigInt>,
    pub signature: Signature,
    #[serde(with = "decimal")]
    pub discriminant: BigInt,
    #[serde(default, with = "decimal::option")]
    pub conductor: Option<BigInt>,
    pub class_number: u64,
}

impl NumberFieldRecord {
    /// Record for a canonical polynomial, its invariants and its label.
    #[must_use]
    pub fn new(label: &Label, polynomial: &Polynomial, invariants: &FieldInvariants) -> Self {
        Self {
            label: label.to_string(),
            degree: invariants.degree,
            coefficients: polynomial.coefficients().to_vec(),
            signature: invariants.signature,
            discriminant: invariants.discriminant.clone(),
            conductor: invariants.conductor.clone(),
            class_number: invariants.class_number,
        }
    }

    /// The reserved rational field record.
    #[must_use]
    pub fn rational() -> Self {
        Self::new(
            &Label::rational(),
            &Polynomial::x(),
            &FieldInvariants::rational(),
        )
    }

    #[must_use]
    pub const fn is_abelian(&self) -> bool {
        self.conductor.is_some()
    }

    /// Check the record shape before it reaches the store.
    pub fn validate(&self) -> Result<Label, Error> {
        let invalid = |message: &str| FieldError::InvalidRecord {
            label: self.label.clone(),
            message: message.to_string(),
        };

        if self.label.chars().count() > FIELD_LABEL_LENGTH as usize {
            return Err(LabelError::TooLong {
                label: self.label.clone(),
                max: FIELD_LABEL_LENGTH,
            }
            .into());
        }
        let label: Label = self.label.parse()?;

        if self.degree == 0 {
            return Err(invalid("degree must be positive").into());
        }
        if self.coefficients.len() != self.degree as usize + 1 {
            return Err(invalid("coefficient count must be degree + 1").into());
        }
        if self.coefficients.last().is_none_or(|c| !c.is_one()) {
            return Err(invalid("defining polynomial must be monic").into());
        }
        if self.signature.degree() != self.degree {
            return Err(invalid("signature does not add up to the degree").into());
        }
        if self.class_number == 0 || i64::try_from(self.class_number).is_err() {
            return Err(invalid("class number must be a positive 64-bit integer").into());
        }

        let expected = LabelPrefix {
            degree: self.degree,
            real_places: self.signature.real,
            abs_discriminant: self.discriminant.abs(),
        };
        let reserved = self.degree == 1 && !label.is_rational();
        if label.prefix() != expected || reserved {
            return Err(LabelError::PrefixMismatch {
                label: self.label.clone(),
                expected: expected.to_string(),
            }
            .into());
        }

        Ok(label)
    }

    /// Decode a row selected with [`RECORD_COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let degree: i64 = row.get(1)?;
        let Point(real, complex) = row.get(3)?;
        let class_number: i64 = row.get(5)?;

        Ok(Self {
            label: row.get(0)?,
            degree: u32::try_from(degree).map_err(|_| corrupt(1, "degree"))?,
            coefficients: row.get::<_, IntArray>(2)?.0,
            signature: Signature::new(
                place_count(real).ok_or_else(|| corrupt(3, "signature"))?,
                place_count(complex).ok_or_else(|| corrupt(3, "signature"))?,
            ),
            conductor: row.get::<_, Option<Numeric>>(4)?.map(|n| n.0),
            class_number: u64::try_from(class_number).map_err(|_| corrupt(5, "class_number"))?,
            discriminant: row.get::<_, Numeric>(6)?.0,
        })
    }
}

fn corrupt(column: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Integer,
        format!("{NUMBER_FIELDS}.{name} holds an unexpected value").into(),
    )
}

// Signature components are stored as point coordinates.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn place_count(x: f64) -> Option<u32> {
    (x.is_finite() && x.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&x))
        .then_some(x as u32)
}

///
/// FieldInsert
///
/// Statement shape for a record. Abelian fields carry a conductor column;
/// the others leave it out entirely.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldInsert {
    WithConductor,
    WithoutConductor,
}

impl FieldInsert {
    #[must_use]
    pub const fn for_record(record: &NumberFieldRecord) -> Self {
        if record.is_abelian() {
            Self::WithConductor
        } else {
            Self::WithoutConductor
        }
    }

    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::WithConductor => &[
                "label",
                "degree",
                "defn_poly_coeffs",
                "signature",
                "conductor",
                "class_number",
                "discriminant",
            ],
            Self::WithoutConductor => &[
                "label",
                "degree",
                "defn_poly_coeffs",
                "signature",
                "class_number",
                "discriminant",
            ],
        }
    }

    #[must_use]
    pub fn statement(self, record: &NumberFieldRecord) -> Insert {
        let mut stmt = Insert::into(NUMBER_FIELDS);
        for &column in self.columns() {
            let value = match column {
                "label" => Value::Text(record.label.clone()),
                "degree" => Value::Integer(i64::from(record.degree)),
                "defn_poly_coeffs" => IntArray::from_slice(&record.coefficients).into(),
                "signature" => Point(
                    f64::from(record.signature.real),
                    f64::from(record.signature.complex),
                )
                .into(),
                "conductor" => record
                    .conductor
                    .clone()
                    .map_or(Value::Null, |c| Numeric(c).into()),
                // Range checked by `validate`.
                "class_number" => Value::Integer(
                    i64::try_from(record.class_number).unwrap_or(i64::MAX),
                ),
                _ => Numeric(record.discriminant.clone()).into(),
            };
            stmt = stmt.value(column, value);
        }

        stmt
    }
}

/// True when `err` is a collision on the label primary key.
#[must_use]
pub fn is_label_conflict(err: &Error) -> bool {
    matches!(
        &err.detail,
        Some(ErrorDetail::Store(store)) if store.violates_unique(NUMBER_FIELDS, &["label"])
    )
}

//
// Connection-level operations
//

/// Validate and insert one record, advancing the prefix's issued ordinal.
pub fn insert_record(tx: &Transaction<'_>, record: &NumberFieldRecord) -> Result<Label, Error> {
    let label = record.validate()?;

    FieldInsert::for_record(record).statement(record).execute(tx)?;
    record_ordinal(tx, &label)?;

    Ok(label)
}

/// Delete the record with `label`. Exactly one row must match.
pub fn delete_record(tx: &Transaction<'_>, label: &str) -> Result<usize, Error> {
    let count: i64 = tx.query_row(
        &format!("SELECT count(*) FROM {NUMBER_FIELDS} WHERE label = ?1"),
        [label],
        |row| row.get(0),
    )?;
    expect_one(count, label)?;

    let deleted = tx
        .execute(&format!("DELETE FROM {NUMBER_FIELDS} WHERE label = ?1"), [label])
        .map_err(|err| match StoreError::from_driver(err) {
            StoreError::ForeignKeyViolation { .. } => StoreError::RestrictViolation {
                table: NUMBER_FIELDS.to_string(),
                value: label.to_string(),
            },
            other => other,
        })?;

    Ok(deleted)
}

pub fn record_by_label(conn: &Connection, label: &str) -> Result<Option<NumberFieldRecord>, Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM {NUMBER_FIELDS} WHERE label = ?1"
    ))?;
    let mut rows = stmt
        .query_map([label], NumberFieldRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    if rows.len() > 1 {
        return Err(multiple_rows("label", label, rows.len()).into());
    }

    Ok(rows.pop())
}

pub fn record_by_coefficients(
    conn: &Connection,
    coefficients: &[BigInt],
) -> Result<Option<NumberFieldRecord>, Error> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM {NUMBER_FIELDS} WHERE defn_poly_coeffs = ?1"),
            [IntArray::from_slice(coefficients)],
            NumberFieldRecord::from_row,
        )
        .optional()?;

    Ok(record)
}

/// Labels starting with `prefix`, lexicographic.
pub fn labels_with_prefix(conn: &Connection, prefix: &str) -> Result<Vec<String>, Error> {
    let pattern = format!("{}%", escape_like(prefix));
    let mut stmt = conn.prepare(&format!(
        "SELECT label FROM {NUMBER_FIELDS} WHERE label LIKE ?1 ESCAPE '\\' ORDER BY label"
    ))?;
    let labels = stmt
        .query_map([pattern], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(labels)
}

/// Highest ordinal ever issued for `prefix`, or zero.
pub fn last_ordinal(conn: &Connection, prefix: &LabelPrefix) -> Result<u64, Error> {
    let last: Option<i64> = conn
        .query_row(
            &format!("SELECT last_ordinal FROM {LABEL_ORDINALS} WHERE prefix = ?1"),
            [prefix.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match last {
        None => Ok(0),
        Some(n) => u64::try_from(n).map_err(|_| {
            StoreError::Corrupt {
                message: format!("{LABEL_ORDINALS}.last_ordinal holds {n}"),
            }
            .into()
        }),
    }
}

/// Number of registered fields.
pub fn count_records(conn: &Connection) -> Result<usize, Error> {
    let count: i64 = conn.query_row(&format!("SELECT count(*) FROM {NUMBER_FIELDS}"), [], |row| {
        row.get(0)
    })?;

    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

// Ordinals only move forward, so a deleted label is never issued again.
fn record_ordinal(tx: &Transaction<'_>, label: &Label) -> Result<(), Error> {
    let ordinal = i64::try_from(label.ordinal).map_err(|_| StoreError::CheckViolation {
        message: format!("ordinal of {label} exceeds the column range"),
    })?;

    tx.execute(
        &format!(
            "INSERT INTO {LABEL_ORDINALS} (prefix, last_ordinal) VALUES (?1, ?2) \
             ON CONFLICT (prefix) DO UPDATE \
             SET last_ordinal = max(last_ordinal, excluded.last_ordinal)"
        ),
        params![label.prefix().to_string(), ordinal],
    )?;

    Ok(())
}

fn expect_one(count: i64, label: &str) -> Result<(), StoreError> {
    match count {
        0 => Err(StoreError::NoRows {
            table: NUMBER_FIELDS.to_string(),
            column: "label".to_string(),
            value: label.to_string(),
        }),
        1 => Ok(()),
        n => Err(multiple_rows(
            "label",
            label,
            usize::try_from(n).unwrap_or(usize::MAX),
        )),
    }
}

fn multiple_rows(column: &str, value: &str, count: usize) -> StoreError {
    StoreError::MultipleRows {
        table: NUMBER_FIELDS.to_string(),
        column: column.to_string(),
        value: value.to_string(),
        count,
    }
}

///
/// FieldRepository
///
/// Standalone access to `number_fields` through an explicit [`Db`] handle.
/// Every call runs in its own transaction.
///

#[derive(Clone, Debug)]
pub struct FieldRepository {
    db: Db,
}

impl FieldRepository {
    #[must_use]
    pub const fn new(db: Db) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    /// Insert a record, returning its committed label.
    pub fn insert(&self, record: &NumberFieldRecord) -> Result<Label, Error> {
        self.db.write(|tx| insert_record(tx, record))
    }

    pub fn delete(&self, label: &str) -> Result<usize, Error> {
        self.db.write(|tx| delete_record(tx, label))
    }

    pub fn find_by_label(&self, label: &str) -> Result<Option<NumberFieldRecord>, Error> {
        self.db.read(|conn| record_by_label(conn, label))
    }

    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<String>, Error> {
        self.db.read(|conn| labels_with_prefix(conn, prefix))
    }

    pub fn find_by_coefficients(
        &self,
        coefficients: &[BigInt],
    ) -> Result<Option<NumberFieldRecord>, Error> {
        self.db
            .read(|conn| record_by_coefficients(conn, coefficients))
    }

    pub fn count(&self) -> Result<usize, Error> {
        self.db.read(count_records)
    }

    /// Candidate label for a field with these invariants.
    pub fn allocate_label(&self, invariants: &FieldInvariants) -> Result<Label, Error> {
        self.db.read(|conn| allocate_label(conn, invariants))
    }
}

///
/// TESTS
///
