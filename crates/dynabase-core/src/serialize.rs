//! Serialization helpers shared by composite columns and the JSON surfaces.
//!
//! Composite columns are CBOR blobs. Integers that can exceed 64 bits are written as
//! decimal strings in human-facing formats so JSON stays lossless.

use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error as ThisError;

use crate::error::ErrorClass;

/// Upper bound on a decoded CBOR payload.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error("deserialize error: {0}")]
    Deserialize(String),
}

impl SerializeError {
    pub(crate) const fn class() -> ErrorClass {
        ErrorClass::Internal
    }
}

/// Serialize a value into CBOR bytes.
pub fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes into a value.
///
/// Input size is bounded before decode and any panic inside the decoder is
/// reported as a deserialize error.
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(SerializeError::Deserialize(
            "payload exceeds maximum allowed size".into(),
        ));
    }

    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// decimal
///
/// `serde(with = ...)` adapters writing big integers and rationals as decimal
/// strings. Deserialization also accepts plain integers.
///

pub mod decimal {
    use num_bigint::BigInt;
    use num_rational::BigRational;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    ///
    /// Decimal
    ///
    /// Newtype used where a container of big integers needs a serde shape.
    ///

    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct Decimal(pub BigInt);

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Signed(i64),
        Unsigned(u64),
        Text(String),
    }

    impl Repr {
        fn into_bigint<E: serde::de::Error>(self) -> Result<BigInt, E> {
            match self {
                Self::Signed(n) => Ok(BigInt::from(n)),
                Self::Unsigned(n) => Ok(BigInt::from(n)),
                Self::Text(s) => BigInt::from_str(s.trim())
                    .map_err(|_| E::custom(format!("invalid integer '{s}'"))),
            }
        }
    }

    impl Serialize for Decimal {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&self.0.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Decimal {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            Repr::deserialize(d)?.into_bigint().map(Self)
        }
    }

    pub fn serialize<S: Serializer>(value: &BigInt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        Repr::deserialize(d)?.into_bigint()
    }

    pub mod option {
        use super::{BigInt, Decimal};
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<BigInt>, s: S) -> Result<S::Ok, S::Error> {
            value.clone().map(Decimal).serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BigInt>, D::Error> {
            Ok(Option::<Decimal>::deserialize(d)?.map(|v| v.0))
        }
    }

    pub mod vec {
        use super::{BigInt, Decimal};
        use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

        pub fn serialize<S: Serializer>(values: &[BigInt], s: S) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(values.len()))?;
            for value in values {
                seq.serialize_element(&value.to_string())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigInt>, D::Error> {
            Ok(Vec::<Decimal>::deserialize(d)?
                .into_iter()
                .map(|v| v.0)
                .collect())
        }
    }

    pub mod rational_vec {
        use super::{BigInt, BigRational, FromStr};
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::SerializeSeq};

        pub fn serialize<S: Serializer>(values: &[BigRational], s: S) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(values.len()))?;
            for value in values {
                seq.serialize_element(&value.to_string())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigRational>, D::Error> {
            let raw = Vec::<String>::deserialize(d)?;

            raw.iter()
                .map(|text| parse_rational(text).map_err(D::Error::custom))
                .collect()
        }

        fn parse_rational(text: &str) -> Result<BigRational, String> {
            let invalid = || format!("invalid rational '{text}'");
            let (numer, denom) = match text.trim().split_once('/') {
                Some((n, d)) => (n.trim(), d.trim()),
                None => (text.trim(), "1"),
            };
            let numer = BigInt::from_str(numer).map_err(|_| invalid())?;
            let denom = BigInt::from_str(denom).map_err(|_| invalid())?;
            if denom == BigInt::from(0) {
                return Err(invalid());
            }

            Ok(BigRational::new(numer, denom))
        }
    }

    ///
    /// TESTS
    ///

    #[cfg(test)]
    mod tests {
        use super::*;

        #[derive(Debug, Deserialize, Serialize, PartialEq)]
        struct Holder {
            #[serde(with = "super")]
            value: BigInt,
            #[serde(with = "super::rational_vec")]
            map: Vec<BigRational>,
        }

        #[test]
        fn accepts_numbers_and_strings() {
            let from_number: Holder =
                serde_json::from_str(r#"{"value": -3969, "map": ["1/2", "-3"]}"#).unwrap();
            let from_text: Holder =
                serde_json::from_str(r#"{"value": "-3969", "map": ["2/4", "-3/1"]}"#).unwrap();

            assert_eq!(from_number, from_text);
            assert_eq!(from_number.value, BigInt::from(-3969));
        }

        #[test]
        fn writes_lossless_strings() {
            let holder = Holder {
                value: BigInt::from(u64::MAX) * 7,
                map: vec![BigRational::new(BigInt::from(-1), BigInt::from(2))],
            };
            let json = serde_json::to_string(&holder).unwrap();

            assert_eq!(json, r#"{"value":"129127208515966861305","map":["-1/2"]}"#);
        }

        #[test]
        fn rejects_zero_denominator() {
            let err = serde_json::from_str::<Holder>(r#"{"value": 1, "map": ["1/0"]}"#);

            assert!(err.is_err());
        }
    }
}
