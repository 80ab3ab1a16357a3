//! Column codecs for values SQLite has no native type for.
//!
//! Integers that can exceed 64 bits are decimal text, integer arrays use the
//! `{a,b,c}` array literal, points use `(x,y)`, and composite types are CBOR
//! blobs. Text encodings are canonical, so unique constraints on these
//! columns compare values rather than spellings.

use crate::serialize::{deserialize, serialize};
use num_bigint::BigInt;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

fn malformed(kind: &str, text: &str) -> FromSqlError {
    FromSqlError::Other(format!("malformed {kind} '{text}'").into())
}

fn text_of<'a>(value: ValueRef<'a>, kind: &str) -> Result<&'a str, FromSqlError> {
    match value {
        ValueRef::Text(bytes) => {
            std::str::from_utf8(bytes).map_err(|_| malformed(kind, "<invalid utf-8>"))
        }
        _ => Err(FromSqlError::InvalidType),
    }
}

///
/// Numeric
///
/// Arbitrary-precision integer column.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Numeric(pub BigInt);

impl From<Numeric> for Value {
    fn from(n: Numeric) -> Self {
        Self::Text(n.0.to_string())
    }
}

impl ToSql for Numeric {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Numeric {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        if let ValueRef::Integer(n) = value {
            return Ok(Self(BigInt::from(n)));
        }
        let text = text_of(value, "numeric")?;

        BigInt::from_str(text)
            .map(Self)
            .map_err(|_| malformed("numeric", text))
    }
}

///
/// IntArray
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IntArray(pub Vec<BigInt>);

impl IntArray {
    #[must_use]
    pub fn from_slice(items: &[BigInt]) -> Self {
        Self(items.to_vec())
    }
}

impl Display for IntArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{n}")?;
        }
        write!(f, "}}")
    }
}

impl FromStr for IntArray {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or(())?;
        if inner.is_empty() {
            return Ok(Self::default());
        }

        inner
            .split(',')
            .map(|n| BigInt::from_str(n).map_err(|_| ()))
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl From<IntArray> for Value {
    fn from(a: IntArray) -> Self {
        Self::Text(a.to_string())
    }
}

impl ToSql for IntArray {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for IntArray {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = text_of(value, "integer array")?;

        text.parse().map_err(|()| malformed("integer array", text))
    }
}

///
/// Point
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point(pub f64, pub f64);

impl Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.0, self.1)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Self::Text(p.to_string())
    }
}

impl FromSql for Point {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = text_of(value, "point")?;
        let parsed = text
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|inner| inner.split_once(','))
            .and_then(|(x, y)| Some(Self(x.parse().ok()?, y.parse().ok()?)));

        parsed.ok_or_else(|| malformed("point", text))
    }
}

///
/// Cbor
///
/// Composite column stored as a CBOR blob.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Cbor<T>(pub T);

impl<T: Serialize> Cbor<T> {
    pub fn to_value(&self) -> Result<Value, crate::Error> {
        Ok(Value::Blob(serialize(&self.0)?))
    }
}

impl<T: DeserializeOwned> FromSql for Cbor<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let bytes = value.as_blob()?;

        deserialize(bytes)
            .map(Self)
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

///
/// TESTS
///
