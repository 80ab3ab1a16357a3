//! Core of Dynabase: canonical number fields, invariant-derived labels, and
//! the relational registry that stores them.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod catalog;
pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod field;
pub mod label;
pub mod obs;
pub mod registry;
pub mod serialize;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use deadline::Deadline;
pub use error::Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::repository::NumberFieldRecord,
        field::{Field, FieldInvariants, NumberField, Polynomial, Signature},
        label::Label,
        registry::Registry,
    };
}
