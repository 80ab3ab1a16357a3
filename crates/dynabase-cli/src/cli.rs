use clap::{Parser, Subcommand};
use num_bigint::BigInt;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dynabase")]
#[command(author, version, about = "Canonical registry of number fields")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (dynabase.toml)
    #[arg(long, global = true, env = "DYNABASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file; overrides `[store] path`
    #[arg(long, global = true, env = "DYNABASE_DB")]
    pub db: Option<PathBuf>,

    /// JSON field table consulted before exact quadratic arithmetic
    #[arg(long, global = true)]
    pub table: Option<PathBuf>,

    /// Print [debug] lines for every registry stage
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the schema DDL
    Schema {
        /// Print the SQLite script `setup` runs instead of PostgreSQL DDL
        #[arg(long)]
        sqlite: bool,
    },

    /// Drop and recreate the schema in the database
    Setup,

    /// Print the canonical form of a field
    Normalize {
        #[command(flatten)]
        field: FieldArgs,

        /// Embedding of the generator as `re,im`
        #[arg(long, allow_hyphen_values = true, value_parser = parse_embedding)]
        embedding: Option<(f64, f64)>,
    },

    /// Report whether a field is already canonical
    Check {
        #[command(flatten)]
        field: FieldArgs,
    },

    /// Register a field and print its label
    Register {
        #[command(flatten)]
        field: FieldArgs,

        /// Fail instead of normalizing a non-canonical field
        #[arg(long)]
        no_normalize: bool,

        /// Give up, committing nothing, after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print the record stored under a label
    Lookup { label: String },

    /// Delete the record stored under a label
    Unregister { label: String },

    /// Ask the external catalog for the label of a field
    CatalogLabel {
        #[command(flatten)]
        field: FieldArgs,
    },

    /// Ask the external catalog for the field behind a label
    CatalogField { label: String },
}

#[derive(clap::Args)]
pub struct FieldArgs {
    /// Coefficients low-to-high (e.g. `-8,0,1`), or `rational`
    #[arg(allow_hyphen_values = true, value_parser = parse_field_spec)]
    pub spec: FieldSpec,

    /// Generator name
    #[arg(long, short, default_value = "a")]
    pub generator: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    Rational,
    Coefficients(Vec<BigInt>),
}

fn parse_field_spec(s: &str) -> Result<FieldSpec, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("rational") || s == "QQ" {
        return Ok(FieldSpec::Rational);
    }

    s.trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|c| {
            c.trim()
                .parse::<BigInt>()
                .map_err(|_| format!("'{}' is not an integer coefficient", c.trim()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(FieldSpec::Coefficients)
}

fn parse_embedding(s: &str) -> Result<(f64, f64), String> {
    let (re, im) = s.split_once(',').unwrap_or((s, "0"));
    let part = |p: &str| {
        p.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", p.trim()))
    };

    Ok((part(re)?, part(im)?))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn field_specs_parse() {
        assert_eq!(parse_field_spec("rational"), Ok(FieldSpec::Rational));
        assert_eq!(
            parse_field_spec("[-8, 0, 1]"),
            Ok(FieldSpec::Coefficients(
                [-8, 0, 1].into_iter().map(BigInt::from).collect()
            ))
        );
        assert!(parse_field_spec("1,x,1").is_err());
    }

    #[test]
    fn negative_coefficients_are_not_flags() {
        let cli = Cli::try_parse_from(["dynabase", "register", "-8,0,1", "-g", "b"]).unwrap();

        let Commands::Register { field, no_normalize, .. } = cli.command else {
            panic!("expected register");
        };
        assert_eq!(field.generator, "b");
        assert!(!no_normalize);
        assert_eq!(
            field.spec,
            FieldSpec::Coefficients([-8, 0, 1].into_iter().map(BigInt::from).collect())
        );
    }

    #[test]
    fn database_path_is_global() {
        let cli = Cli::try_parse_from(["dynabase", "lookup", "2.2.8.1", "--db", "/tmp/f.db"]).unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("/tmp/f.db")));
        assert!(matches!(cli.command, Commands::Lookup { .. }));
    }

    #[test]
    fn embeddings_parse() {
        assert_eq!(parse_embedding("-1.5,2"), Ok((-1.5, 2.0)));
        assert_eq!(parse_embedding("3"), Ok((3.0, 0.0)));
        assert!(parse_embedding("i").is_err());
    }
}
