//! Dynamical-system rows keyed by the label of their base field.
//!
//! Only the record shape and the `base_field_label` foreign key live here;
//! the systems themselves are classified elsewhere.

use crate::{
    Error,
    db::{
        Db, StoreError,
        schema::{FUNCTIONS_DIM_1_NF, NUMBER_FIELDS},
        statement::Insert,
        value::Cbor,
    },
    serialize::decimal,
};
use derive_more::Display;
use num_bigint::BigInt;
use rusqlite::{OptionalExtension, Row, types::Value};
use serde::{Deserialize, Serialize};

const SYSTEM_COLUMNS: &str = "function_id, degree, base_field_label, base_field_degree, \
     ordinal, original_model, display_model, is_polynomial";

///
/// DisplayModel
///
/// Which model of a system is shown by default.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum DisplayModel {
    #[default]
    #[display("original")]
    Original,
    #[display("reduced")]
    Reduced,
    #[display("monic centered")]
    MonicCentered,
    #[display("chebyshev")]
    Chebyshev,
    #[display("newton")]
    Newton,
}

impl DisplayModel {
    pub const ALL: [Self; 5] = [
        Self::Original,
        Self::Reduced,
        Self::MonicCentered,
        Self::Chebyshev,
        Self::Newton,
    ];

    fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.to_string() == text)
    }
}

///
/// Model
///
/// One presentation of a map, stored as a `model_type` composite.
/// Coefficients are kept as text so elements of the base field survive.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Model {
    pub coeffs: Vec<String>,
    pub resultant: String,
    #[serde(with = "decimal::vec")]
    pub bad_primes: Vec<BigInt>,
    pub height: f64,
    pub base_field_label: String,
}

///
/// SystemRecord
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemRecord {
    pub degree: u32,
    pub base_field_label: String,
    pub base_field_degree: u32,
    pub ordinal: Option<u64>,
    pub original_model: Option<Model>,
    pub display_model: DisplayModel,
    pub is_polynomial: bool,
}

impl SystemRecord {
    fn statement(&self) -> Result<Insert, Error> {
        let ordinal = self
            .ordinal
            .map(i64::try_from)
            .transpose()
            .map_err(|_| StoreError::CheckViolation {
                message: format!("{FUNCTIONS_DIM_1_NF}.ordinal exceeds the column range"),
            })?;
        let original_model = match &self.original_model {
            Some(model) => Cbor(model).to_value()?,
            None => Value::Null,
        };

        Ok(Insert::into(FUNCTIONS_DIM_1_NF)
            .value("degree", i64::from(self.degree))
            .value("base_field_label", self.base_field_label.clone())
            .value("base_field_degree", i64::from(self.base_field_degree))
            .value("ordinal", ordinal)
            .value("original_model", original_model)
            .value("display_model", self.display_model.to_string())
            .value("is_polynomial", self.is_polynomial))
    }
}

///
/// StoredSystem
///

#[derive(Clone, Debug, PartialEq)]
pub struct StoredSystem {
    pub function_id: u64,
    pub record: SystemRecord,
}

impl StoredSystem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let corrupt = |column: usize| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Integer,
                format!("{FUNCTIONS_DIM_1_NF} column {column} holds an unexpected value").into(),
            )
        };
        let narrow = |column: usize| -> rusqlite::Result<u32> {
            let n: Option<i64> = row.get(column)?;
            u32::try_from(n.unwrap_or(0)).map_err(|_| corrupt(column))
        };

        let function_id: i64 = row.get(0)?;
        let ordinal: Option<i64> = row.get(4)?;
        let display_model = match row.get::<_, Option<String>>(6)? {
            None => DisplayModel::default(),
            Some(text) => DisplayModel::parse(&text).ok_or_else(|| corrupt(6))?,
        };

        Ok(Self {
            function_id: u64::try_from(function_id).map_err(|_| corrupt(0))?,
            record: SystemRecord {
                degree: narrow(1)?,
                base_field_label: row.get(2)?,
                base_field_degree: narrow(3)?,
                ordinal: ordinal
                    .map(u64::try_from)
                    .transpose()
                    .map_err(|_| corrupt(4))?,
                original_model: row.get::<_, Option<Cbor<Model>>>(5)?.map(|m| m.0),
                display_model,
                is_polynomial: row.get::<_, Option<bool>>(7)?.unwrap_or(false),
            },
        })
    }
}

///
/// SystemRepository
///

#[derive(Clone, Debug)]
pub struct SystemRepository {
    db: Db,
}

impl SystemRepository {
    #[must_use]
    pub const fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a system, returning its serial id. The base field must be
    /// registered.
    pub fn insert(&self, record: &SystemRecord) -> Result<u64, Error> {
        let statement = record.statement()?;

        self.db.write(|tx| {
            let base: Option<i64> = tx
                .query_row(
                    &format!("SELECT 1 FROM {NUMBER_FIELDS} WHERE label = ?1"),
                    [&record.base_field_label],
                    |row| row.get(0),
                )
                .optional()?;
            if base.is_none() {
                return Err(StoreError::NoRows {
                    table: NUMBER_FIELDS.to_string(),
                    column: "label".to_string(),
                    value: record.base_field_label.clone(),
                }
                .into());
            }

            let id = statement.execute(tx)?;

            Ok(u64::try_from(id).unwrap_or_default())
        })
    }

    /// Systems over one base field, by id.
    pub fn by_base_field(&self, label: &str) -> Result<Vec<StoredSystem>, Error> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SYSTEM_COLUMNS} FROM {FUNCTIONS_DIM_1_NF} \
                 WHERE base_field_label = ?1 ORDER BY function_id"
            ))?;
            let systems = stmt
                .query_map([label], StoredSystem::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(systems)
        })
    }

    pub fn delete(&self, function_id: u64) -> Result<usize, Error> {
        let id = i64::try_from(function_id).unwrap_or(i64::MAX);

        self.db.write(|tx| {
            let deleted = tx.execute(
                &format!("DELETE FROM {FUNCTIONS_DIM_1_NF} WHERE function_id = ?1"),
                [id],
            )?;
            if deleted == 0 {
                return Err(StoreError::NoRows {
                    table: FUNCTIONS_DIM_1_NF.to_string(),
                    column: "function_id".to_string(),
                    value: function_id.to_string(),
                }
                .into());
            }

            Ok(deleted)
        })
    }
}

///
/// TESTS
///
