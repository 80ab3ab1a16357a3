//! Relational shape of the registry.
//!
//! The schema is a static model. It renders to PostgreSQL-flavoured DDL
//! for reference, and to the SQLite script [`setup`] applies to a [`Db`].
//! Setup drops and recreates every relation it names, so running it twice
//! is the same as running it once.
//!
//! SQLite has no custom types: enums become checked text, composites become
//! CBOR blobs, arrays and points use the text codecs in [`crate::db::value`],
//! and `numeric` columns hold decimal text.

use crate::{Error, db::Db, error::ErrorClass};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

pub const NUMBER_FIELDS: &str = "number_fields";
pub const LABEL_ORDINALS: &str = "label_ordinals";
pub const FUNCTIONS_DIM_1_NF: &str = "functions_dim_1_nf";
pub const GRAPHS_DIM_1_NF: &str = "graphs_dim_1_nf";
pub const RATIONAL_PREPERIODIC_DIM_1_NF: &str = "rational_preperiodic_dim_1_nf";

pub const BASE_FIELD_TYPE: &str = "base_field_type";
pub const MODEL_TYPE: &str = "model_type";
pub const DISPLAY_MODEL_TYPE: &str = "display_model_type";

/// Width of every `varchar` column holding a field label.
pub const FIELD_LABEL_LENGTH: u32 = 64;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("invalid definition of '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("column '{column}' of relation '{table}' does not exist")]
    MissingColumn { table: String, column: String },

    #[error("relation '{0}' does not exist")]
    MissingRelation(String),

    #[error("type '{0}' does not exist")]
    MissingType(String),
}

impl SchemaError {
    pub(crate) const fn class() -> ErrorClass {
        ErrorClass::Schema
    }
}

///
/// ColumnType
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ColumnType {
    Boolean,
    Integer,
    /// Arbitrary-precision integer.
    Numeric,
    Real,
    Serial,
    Text,
    Varchar(Option<u32>),
    Point,
    Array(Box<Self>),
    /// A composite or enum type created with `CREATE TYPE`.
    Named(String),
}

impl ColumnType {
    #[must_use]
    pub fn array(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }

    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    #[must_use]
    pub const fn label() -> Self {
        Self::Varchar(Some(FIELD_LABEL_LENGTH))
    }

    /// SQLite declared type, plus a check on `column` where the type
    /// carries one.
    fn sqlite(
        &self,
        column: &str,
        types: &[TypeDef],
    ) -> Result<(&'static str, Option<String>), SchemaError> {
        let declared = match self {
            Self::Boolean | Self::Integer | Self::Serial => ("INTEGER", None),
            Self::Real => ("REAL", None),
            Self::Numeric | Self::Text | Self::Varchar(None) | Self::Point | Self::Array(_) => {
                ("TEXT", None)
            }
            Self::Varchar(Some(n)) => ("TEXT", Some(format!("length({column}) <= {n}"))),
            Self::Named(name) => match types.iter().find(|t| t.name() == name) {
                Some(TypeDef::Enum { labels, .. }) => {
                    let labels: Vec<String> = labels.iter().map(|l| format!("'{l}'")).collect();
                    ("TEXT", Some(format!("{column} IN ({})", labels.join(", "))))
                }
                Some(TypeDef::Composite { .. }) => ("BLOB", None),
                None => return Err(SchemaError::MissingType(name.clone())),
            },
        };

        Ok(declared)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Numeric => write!(f, "numeric"),
            Self::Real => write!(f, "real"),
            Self::Serial => write!(f, "serial"),
            Self::Text => write!(f, "text"),
            Self::Varchar(None) => write!(f, "varchar"),
            Self::Varchar(Some(n)) => write!(f, "varchar({n})"),
            Self::Point => write!(f, "point"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

///
/// ColumnDef
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: true,
        }
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }

        Ok(())
    }
}

///
/// ForeignKey
///
/// Restrict semantics: a referenced row cannot be deleted while referenced.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
    pub referenced_column: String,
}

///
/// TableDef
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<String>,
    pub unique: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: None,
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a primary-key column; it is implicitly `NOT NULL`.
    #[must_use]
    pub fn primary(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.push(ColumnDef::new(name, ty).not_null());
        self.primary_key = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique
            .push(columns.iter().map(ToString::to_string).collect());
        self
    }

    #[must_use]
    pub fn references(mut self, column: &str, table: &str, referenced_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            references: table.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Every unique constraint as `(constraint name, columns)`, primary key first.
    #[must_use]
    pub fn unique_constraints(&self) -> Vec<(String, Vec<String>)> {
        let mut out = Vec::new();
        if let Some(pk) = &self.primary_key {
            out.push((format!("{}_pkey", self.name), vec![pk.clone()]));
        }
        for cols in &self.unique {
            out.push((format!("{}_{}_key", self.name, cols.join("_")), cols.clone()));
        }

        out
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<&ColumnDef, SchemaError> {
        self.find_column(name)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Structural checks that do not depend on other relations.
    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |message: String| SchemaError::InvalidDefinition {
            name: self.name.clone(),
            message,
        };

        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(invalid(format!("column '{}' defined twice", col.name)));
            }
        }
        if let Some(pk) = &self.primary_key {
            self.require_column(pk)?;
        }
        for col in self.unique.iter().flatten() {
            self.require_column(col)?;
        }
        for fk in &self.foreign_keys {
            self.require_column(&fk.column)?;
        }

        Ok(())
    }
}

impl TableDef {
    /// `CREATE TABLE` statement for SQLite. Foreign keys restrict deletes.
    pub fn to_sqlite(&self, types: &[TypeDef]) -> Result<String, SchemaError> {
        self.validate()?;

        let mut lines = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let is_pk = self.primary_key.as_deref() == Some(col.name.as_str());
            if is_pk && col.ty == ColumnType::Serial {
                lines.push(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", col.name));
                continue;
            }

            let (affinity, check) = col.ty.sqlite(&col.name, types)?;
            let mut line = format!("{} {affinity}", col.name);
            if !col.nullable {
                line.push_str(" NOT NULL");
            }
            if is_pk {
                line.push_str(" PRIMARY KEY");
            }
            if let Some(check) = check {
                line.push_str(&format!(" CHECK ({check})"));
            }
            lines.push(line);
        }
        lines.extend(
            self.unique
                .iter()
                .map(|cols| format!("UNIQUE ({})", cols.join(", "))),
        );
        lines.extend(self.foreign_keys.iter().map(|fk| {
            format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE RESTRICT",
                fk.column, fk.references, fk.referenced_column
            )
        }));

        Ok(format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.name,
            lines.join(",\n    ")
        ))
    }
}

impl Display for TableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CREATE TABLE {} (", self.name)?;

        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                if self.primary_key.as_deref() == Some(col.name.as_str()) {
                    format!("{} {} PRIMARY KEY", col.name, col.ty)
                } else {
                    col.to_string()
                }
            })
            .collect();
        lines.extend(
            self.unique
                .iter()
                .map(|cols| format!("UNIQUE ({})", cols.join(", "))),
        );
        lines.extend(self.foreign_keys.iter().map(|fk| {
            format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                fk.column, fk.references, fk.referenced_column
            )
        }));

        writeln!(f, "    {}", lines.join(",\n    "))?;
        write!(f, ")")
    }
}

///
/// TypeDef
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TypeDef {
    Composite { name: String, fields: Vec<ColumnDef> },
    Enum { name: String, labels: Vec<String> },
}

impl TypeDef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Composite { name, .. } | Self::Enum { name, .. } => name,
        }
    }
}

impl Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite { name, fields } => {
                let fields: Vec<String> = fields.iter().map(ToString::to_string).collect();
                write!(f, "CREATE TYPE {name} AS (\n    {}\n)", fields.join(",\n    "))
            }
            Self::Enum { name, labels } => {
                let labels: Vec<String> = labels.iter().map(|l| format!("'{l}'")).collect();
                write!(f, "CREATE TYPE {name} AS ENUM ({})", labels.join(", "))
            }
        }
    }
}

///
/// Schema
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    pub types: Vec<TypeDef>,
    pub tables: Vec<TableDef>,
}

impl Schema {
    /// Number fields, their label counters, and the dimension-1 dynamical
    /// systems defined over them. Tables are listed so that every foreign
    /// key points at an earlier table.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            types: standard_types(),
            tables: vec![
                number_fields_table(),
                label_ordinals_table(),
                functions_table(),
                graphs_table(),
                rational_preperiodic_table(),
            ],
        }
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableDef> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    /// The script [`setup`] runs: drops in reverse order, then creates.
    /// Every foreign key must point at an earlier table.
    pub fn to_sqlite(&self) -> Result<String, SchemaError> {
        let mut script = String::new();
        for table in self.tables.iter().rev() {
            script.push_str(&format!("DROP TABLE IF EXISTS {};\n", table.name));
        }
        for (i, table) in self.tables.iter().enumerate() {
            if let Some(fk) = table
                .foreign_keys
                .iter()
                .find(|fk| !self.tables[..i].iter().any(|t| t.name == fk.references))
            {
                return Err(SchemaError::MissingRelation(fk.references.clone()));
            }
            script.push_str(&format!("\n{};\n", table.to_sqlite(&self.types)?));
        }

        Ok(script)
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in self.tables.iter().rev() {
            writeln!(f, "DROP TABLE IF EXISTS {} CASCADE;", table.name)?;
        }
        for ty in self.types.iter().rev() {
            writeln!(f, "DROP TYPE IF EXISTS {} CASCADE;", ty.name())?;
        }
        for ty in &self.types {
            writeln!(f, "\n{ty};")?;
        }
        for table in &self.tables {
            writeln!(f, "\n{table};")?;
        }

        Ok(())
    }
}

/// Drop and recreate every relation in `schema`, in one transaction.
pub fn setup(db: &Db, schema: &Schema) -> Result<(), Error> {
    let script = schema.to_sqlite()?;

    db.write(|tx| Ok(tx.execute_batch(&script)?))
}

/// Names of the tables present in the database, sorted.
pub fn table_names(db: &Db) -> Result<Vec<String>, Error> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    })
}

fn standard_types() -> Vec<TypeDef> {
    vec![
        TypeDef::Enum {
            name: DISPLAY_MODEL_TYPE.to_string(),
            labels: ["original", "reduced", "monic centered", "chebyshev", "newton"]
                .map(String::from)
                .to_vec(),
        },
        TypeDef::Composite {
            name: BASE_FIELD_TYPE.to_string(),
            fields: vec![
                ColumnDef::new("label", ColumnType::label()),
                ColumnDef::new("degree", ColumnType::Integer),
            ],
        },
        TypeDef::Composite {
            name: MODEL_TYPE.to_string(),
            fields: vec![
                ColumnDef::new("coeffs", ColumnType::array(ColumnType::Varchar(None))),
                ColumnDef::new("resultant", ColumnType::Varchar(None)),
                ColumnDef::new("bad_primes", ColumnType::array(ColumnType::Integer)),
                ColumnDef::new("height", ColumnType::Real),
                ColumnDef::new("base_field_label", ColumnType::label()),
            ],
        },
    ]
}

fn number_fields_table() -> TableDef {
    TableDef::new(NUMBER_FIELDS)
        .primary("label", ColumnType::label())
        .column(ColumnDef::new("degree", ColumnType::Integer).not_null())
        .column(
            ColumnDef::new("defn_poly_coeffs", ColumnType::array(ColumnType::Integer)).not_null(),
        )
        .column(ColumnDef::new("signature", ColumnType::Point).not_null())
        .column(ColumnDef::new("conductor", ColumnType::Numeric))
        .column(ColumnDef::new("class_number", ColumnType::Integer).not_null())
        .column(ColumnDef::new("discriminant", ColumnType::Numeric).not_null())
        .unique(&["defn_poly_coeffs"])
}

fn label_ordinals_table() -> TableDef {
    TableDef::new(LABEL_ORDINALS)
        .primary("prefix", ColumnType::label())
        .column(ColumnDef::new("last_ordinal", ColumnType::Integer).not_null())
}

fn functions_table() -> TableDef {
    let label = ColumnType::label;
    let model = || ColumnType::named(MODEL_TYPE);

    TableDef::new(FUNCTIONS_DIM_1_NF)
        .primary("function_id", ColumnType::Serial)
        .column(ColumnDef::new("degree", ColumnType::Integer))
        .column(ColumnDef::new("base_field_label", label()).not_null())
        .column(ColumnDef::new("base_field_degree", ColumnType::Integer))
        .column(ColumnDef::new("sigma_one", ColumnType::Varchar(None)))
        .column(ColumnDef::new("sigma_two", ColumnType::Varchar(None)))
        .column(ColumnDef::new("ordinal", ColumnType::Integer))
        .column(ColumnDef::new("citations", ColumnType::array(ColumnType::Integer)))
        .column(ColumnDef::new("family", ColumnType::array(ColumnType::Integer)))
        .column(ColumnDef::new("original_model", model()))
        .column(ColumnDef::new("monic_centered", model()))
        .column(ColumnDef::new("reduced_model", model()))
        .column(ColumnDef::new(
            "newton_polynomial_coeffs",
            ColumnType::array(ColumnType::Varchar(None)),
        ))
        .column(ColumnDef::new(
            "display_model",
            ColumnType::named(DISPLAY_MODEL_TYPE),
        ))
        .column(ColumnDef::new("is_polynomial", ColumnType::Boolean))
        .column(ColumnDef::new("is_chebyshev", ColumnType::Boolean))
        .column(ColumnDef::new("is_newton", ColumnType::Boolean))
        .column(ColumnDef::new("is_lattes", ColumnType::Boolean))
        .column(ColumnDef::new("is_pcf", ColumnType::Boolean))
        .column(ColumnDef::new("cp_cardinality", ColumnType::Integer))
        .column(ColumnDef::new("cp_field_of_defn", label()))
        .column(ColumnDef::new(
            "automorphism_group_cardinality",
            ColumnType::Integer,
        ))
        .column(ColumnDef::new(
            "rational_twists",
            ColumnType::array(ColumnType::Integer),
        ))
        .column(ColumnDef::new(
            "critical_portrait_graph_id",
            ColumnType::Varchar(None),
        ))
        .references("base_field_label", NUMBER_FIELDS, "label")
}

fn graphs_table() -> TableDef {
    let ints = || ColumnType::array(ColumnType::Integer);

    TableDef::new(GRAPHS_DIM_1_NF)
        .primary("graph_id", ColumnType::Serial)
        .column(ColumnDef::new("cardinality", ColumnType::Integer))
        .column(ColumnDef::new("edges", ints()))
        .column(ColumnDef::new("num_components", ColumnType::Integer))
        .column(ColumnDef::new("periodic_cycles", ints()))
        .column(ColumnDef::new("periodic_cardinality", ColumnType::Integer))
        .column(ColumnDef::new("preperiodic_components", ints()))
        .column(ColumnDef::new("positive_in_degree", ColumnType::Integer))
        .column(ColumnDef::new("max_tail", ColumnType::Integer))
        .column(ColumnDef::new("type", ColumnType::Integer))
}

fn rational_preperiodic_table() -> TableDef {
    TableDef::new(RATIONAL_PREPERIODIC_DIM_1_NF)
        .primary("id", ColumnType::Serial)
        .column(ColumnDef::new("function_id", ColumnType::Integer))
        .column(ColumnDef::new("base_field_label", ColumnType::label()))
        .column(ColumnDef::new(
            "rational_periodic_points",
            ColumnType::array(ColumnType::array(ColumnType::Varchar(None))),
        ))
        .column(ColumnDef::new("graph_id", ColumnType::Integer))
        .references("function_id", FUNCTIONS_DIM_1_NF, "function_id")
        .references("base_field_label", NUMBER_FIELDS, "label")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_is_well_formed() {
        let schema = Schema::standard();

        for table in &schema.tables {
            table.validate().unwrap();
        }
        let nf = schema.table(NUMBER_FIELDS).unwrap();
        assert_eq!(
            nf.unique_constraints(),
            vec![
                ("number_fields_pkey".to_string(), vec!["label".to_string()]),
                (
                    "number_fields_defn_poly_coeffs_key".to_string(),
                    vec!["defn_poly_coeffs".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn renders_ddl() {
        let ddl = Schema::standard().to_string();

        assert!(ddl.starts_with("DROP TABLE IF EXISTS rational_preperiodic_dim_1_nf CASCADE;"));
        assert!(ddl.contains(
            "CREATE TYPE display_model_type AS ENUM ('original', 'reduced', 'monic centered', 'chebyshev', 'newton');"
        ));
        assert!(ddl.contains("    label varchar(64) PRIMARY KEY,\n"));
        assert!(ddl.contains("    defn_poly_coeffs integer[] NOT NULL,\n"));
        assert!(ddl.contains("    original_model model_type,\n"));
        assert!(ddl.contains("FOREIGN KEY (base_field_label) REFERENCES number_fields (label)"));
        assert!(ddl.contains("rational_periodic_points varchar[][],"));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let table = TableDef::new("t")
            .column(ColumnDef::new("x", ColumnType::Integer))
            .column(ColumnDef::new("x", ColumnType::Text));

        assert!(matches!(
            table.validate(),
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn renders_sqlite_script() {
        let script = Schema::standard().to_sqlite().unwrap();

        assert!(script.starts_with("DROP TABLE IF EXISTS rational_preperiodic_dim_1_nf;\n"));
        assert!(script.contains("    label TEXT NOT NULL PRIMARY KEY CHECK (length(label) <= 64),\n"));
        assert!(script.contains("    discriminant TEXT NOT NULL,\n"));
        assert!(script.contains("    function_id INTEGER PRIMARY KEY AUTOINCREMENT,\n"));
        assert!(script.contains("    original_model BLOB,\n"));
        assert!(script.contains(
            "display_model TEXT CHECK (display_model IN ('original', 'reduced', 'monic centered', 'chebyshev', 'newton'))"
        ));
        assert!(script.contains(
            "FOREIGN KEY (base_field_label) REFERENCES number_fields (label) ON DELETE RESTRICT"
        ));
    }

    #[test]
    fn sqlite_rendering_needs_known_types_and_ordered_tables() {
        let mut schema = Schema::standard();
        schema.types.retain(|t| t.name() != MODEL_TYPE);
        assert!(matches!(
            schema.to_sqlite(),
            Err(SchemaError::MissingType(ref name)) if name == MODEL_TYPE
        ));

        let mut schema = Schema::standard();
        schema.tables.reverse();
        assert!(matches!(
            schema.to_sqlite(),
            Err(SchemaError::MissingRelation(_))
        ));
    }

    #[test]
    fn setup_is_idempotent() {
        let db = Db::in_memory().unwrap();
        let schema = Schema::standard();

        setup(&db, &schema).unwrap();
        setup(&db, &schema).unwrap();

        let names = table_names(&db).unwrap();
        assert_eq!(
            names,
            vec![
                FUNCTIONS_DIM_1_NF,
                GRAPHS_DIM_1_NF,
                LABEL_ORDINALS,
                NUMBER_FIELDS,
                RATIONAL_PREPERIODIC_DIM_1_NF,
            ]
        );
    }

    #[test]
    fn setup_applies_label_width_checks() {
        let db = Db::in_memory().unwrap();
        setup(&db, &Schema::standard()).unwrap();

        let err = db
            .write(|tx| {
                tx.execute(
                    "INSERT INTO label_ordinals (prefix, last_ordinal) VALUES (?1, 1)",
                    ["9".repeat(65)],
                )?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::Schema);
    }
}
