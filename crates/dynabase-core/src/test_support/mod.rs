use crate::{
    db::{
        Db,
        repository::NumberFieldRecord,
        schema::{Schema, setup},
    },
    field::{FieldInvariants, NativeBackend, Polynomial, Signature, TableBackend, TableField},
};
use num_bigint::BigInt;
use num_complex::Complex64;
use std::{
    fs,
    path::{Path, PathBuf},
    process,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Two real cyclic cubics sharing discriminant 3969, plus one alias.
pub const CUBIC_FIELDS_JSON: &str = include_str!("../../data/cubic_fields.json");

/// Table backend over the cubic fixture, without a fallback.
#[must_use]
pub fn cubic_table() -> TableBackend {
    TableBackend::from_json(CUBIC_FIELDS_JSON).unwrap()
}

/// Cubic table falling back to exact quadratic arithmetic.
#[must_use]
pub fn mixed_backend() -> TableBackend {
    cubic_table().with_fallback(Arc::new(NativeBackend))
}

/// Fresh in-memory database with the standard schema.
#[must_use]
pub fn schema_db() -> Db {
    let db = Db::in_memory().unwrap();
    setup(&db, &Schema::standard()).unwrap();

    db
}

///
/// TempDb
///
/// Database file path unique to one test, removed with its WAL files on drop.
///

pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    #[must_use]
    pub fn new(name: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("dynabase-{name}-{}-{n}.db", process::id()));
        let file = Self { path };
        file.remove();

        file
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remove(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = fs::remove_file(path);
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Table of `count` distinct cubics `x^3 - 21x - k`, all reporting the
/// invariants of [`cubic_invariants`] so that they share one label prefix.
/// Returns the table and the coefficient lists.
#[must_use]
pub fn shared_prefix_table(count: i64) -> (TableBackend, Vec<Vec<i64>>) {
    let mut table = TableBackend::new();
    let mut polys = Vec::new();

    for k in 1..=count {
        let coeffs = vec![-(1000 + k), -21, 0, 1];
        table
            .insert_field(TableField {
                polynomial: Polynomial::from_i64s(&coeffs).unwrap(),
                invariants: cubic_invariants(),
                roots: [-1.0, 0.0, 1.0].map(|x| Complex64::new(x, 0.0)).to_vec(),
            })
            .unwrap();
        polys.push(coeffs);
    }

    (table, polys)
}

#[must_use]
pub fn cubic_invariants() -> FieldInvariants {
    FieldInvariants {
        degree: 3,
        signature: Signature::new(3, 0),
        discriminant: BigInt::from(3969),
        class_number: 1,
        conductor: Some(BigInt::from(63)),
    }
}

fn record(label: &str, coeffs: &[i64], invariants: FieldInvariants) -> NumberFieldRecord {
    NumberFieldRecord {
        label: label.to_string(),
        degree: invariants.degree,
        coefficients: coeffs.iter().copied().map(BigInt::from).collect(),
        signature: invariants.signature,
        discriminant: invariants.discriminant,
        conductor: invariants.conductor,
        class_number: invariants.class_number,
    }
}

/// `x^3 - 21x - 28` under `label`.
#[must_use]
pub fn cubic_a(label: &str) -> NumberFieldRecord {
    record(label, &[-28, -21, 0, 1], cubic_invariants())
}

/// `x^3 - 21x - 35` under `label`.
#[must_use]
pub fn cubic_b(label: &str) -> NumberFieldRecord {
    record(label, &[-35, -21, 0, 1], cubic_invariants())
}

/// Quadratic record with class number one and conductor `|disc|`.
#[must_use]
pub fn quadratic_record(label: &str, coeffs: &[i64], disc: i64) -> NumberFieldRecord {
    let signature = if disc > 0 {
        Signature::new(2, 0)
    } else {
        Signature::new(0, 1)
    };

    record(
        label,
        coeffs,
        FieldInvariants {
            degree: 2,
            signature,
            discriminant: BigInt::from(disc),
            class_number: 1,
            conductor: Some(BigInt::from(disc.abs())),
        },
    )
}
