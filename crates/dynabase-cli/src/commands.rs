use crate::cli::{FieldArgs, FieldSpec};
use dynabase_core::{
    Error,
    catalog::{LabelResolver, LmfdbCatalog},
    config::{ConfigError, DynabaseConfig},
    db::{
        Db,
        schema::{Schema, setup as setup_schema, table_names},
    },
    error::{ErrorClass, ErrorOrigin},
    field::{Field, FieldBackend, FieldMap, NativeBackend, NumberField, Polynomial, TableBackend},
    obs::{EventSink, FileSink, StderrSink},
    registry::Registry,
};
use num_complex::Complex64;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

///
/// Context
///

pub struct Context {
    config: DynabaseConfig,
    table: Option<PathBuf>,
}

impl Context {
    pub fn new(config: DynabaseConfig, table: Option<&Path>) -> Self {
        Self {
            config,
            table: table.map(Path::to_path_buf),
        }
    }

    fn backend(&self) -> Result<Arc<dyn FieldBackend>, Error> {
        let Some(path) = &self.table else {
            return Ok(Arc::new(NativeBackend));
        };
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        Ok(Arc::new(
            TableBackend::from_json(&text)?.with_fallback(Arc::new(NativeBackend)),
        ))
    }

    fn sink(&self) -> Result<Arc<dyn EventSink>, Error> {
        Ok(match &self.config.log.path {
            Some(path) => Arc::new(FileSink::open(path)?),
            None => Arc::new(StderrSink),
        })
    }

    fn catalog(&self) -> Result<LmfdbCatalog, Error> {
        LmfdbCatalog::new(&self.config.catalog.base_url)
    }

    fn open(&self) -> Result<Db, Error> {
        Db::open_with(&self.config.store)
    }

    fn registry(&self, db: Db) -> Result<Registry, Error> {
        Ok(Registry::new(db, self.backend()?)
            .configured(&self.config)
            .sink(self.sink()?)
            .resolver(Arc::new(self.catalog()?)))
    }
}

fn build_field(args: &FieldArgs) -> Result<Field, Error> {
    match &args.spec {
        FieldSpec::Rational => Ok(Field::Rational),
        FieldSpec::Coefficients(coeffs) => {
            let polynomial = Polynomial::new(coeffs.clone())?;

            Ok(NumberField::new(polynomial, args.generator.clone())?.into())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| Error::new(ErrorClass::Internal, ErrorOrigin::Serialize, err.to_string()))?;
    println!("{text}");

    Ok(())
}

///
/// FieldOutput
///

#[derive(Serialize)]
struct FieldOutput {
    field: String,
    coefficients: Option<Vec<String>>,
    generator: Option<String>,
    embedding: Option<(f64, f64)>,
}

impl From<&Field> for FieldOutput {
    fn from(field: &Field) -> Self {
        let (generator, embedding) = match field {
            Field::Absolute(nf) => (
                Some(nf.generator().to_string()),
                nf.embedding().map(|z| (z.re, z.im)),
            ),
            _ => (None, None),
        };

        Self {
            field: field.to_string(),
            coefficients: field
                .defining_polynomial()
                .map(|p| p.coefficients().iter().map(ToString::to_string).collect()),
            generator,
            embedding,
        }
    }
}

//
// Commands
//

pub fn schema(sqlite: bool) -> Result<(), Error> {
    let schema = Schema::standard();
    if sqlite {
        print!("{}", schema.to_sqlite()?);
    } else {
        print!("{schema}");
    }

    Ok(())
}

pub fn setup(ctx: &Context) -> Result<(), Error> {
    let db = ctx.open()?;
    setup_schema(&db, &Schema::standard())?;

    let tables = table_names(&db)?;
    print_json(&serde_json::json!({ "tables": tables }))
}

pub fn normalize(
    ctx: &Context,
    args: &FieldArgs,
    embedding: Option<(f64, f64)>,
) -> Result<(), Error> {
    #[derive(Serialize)]
    struct Output {
        #[serde(flatten)]
        field: FieldOutput,
        map: FieldMap,
        unchanged: bool,
    }

    let field = build_field(args)?;
    let registry = ctx.registry(Db::in_memory()?)?;
    let out = registry.normalize(&field, embedding.map(|(re, im)| Complex64::new(re, im)))?;

    print_json(&Output {
        field: FieldOutput::from(&out.field),
        unchanged: out.is_unchanged(&field),
        map: out.map,
    })
}

pub fn check(ctx: &Context, args: &FieldArgs) -> Result<(), Error> {
    let field = build_field(args)?;
    let normalized = ctx.registry(Db::in_memory()?)?.is_normalized(&field)?;

    print_json(&serde_json::json!({ "normalized": normalized }))
}

pub fn register(
    ctx: &Context,
    args: &FieldArgs,
    normalize_if_needed: bool,
    timeout_ms: Option<u64>,
) -> Result<(), Error> {
    let field = build_field(args)?;
    let registry = ctx.registry(ctx.open()?)?;

    let label = match timeout_ms {
        Some(ms) => {
            registry.register_with_timeout(&field, normalize_if_needed, Duration::from_millis(ms))?
        }
        None => registry.register(&field, normalize_if_needed)?,
    };

    print_json(&serde_json::json!({ "label": label.to_string() }))
}

pub fn lookup(ctx: &Context, label: &str) -> Result<(), Error> {
    let record = ctx.registry(ctx.open()?)?.lookup(label)?;

    print_json(&record)
}

pub fn unregister(ctx: &Context, label: &str) -> Result<(), Error> {
    let deleted = ctx.registry(ctx.open()?)?.unregister(label)?;

    print_json(&serde_json::json!({ "deleted": deleted }))
}

pub fn catalog_label(ctx: &Context, args: &FieldArgs) -> Result<(), Error> {
    let field = build_field(args)?;
    let label = ctx
        .catalog()?
        .resolve_label(&field, ctx.config.catalog.timeout())?;

    print_json(&serde_json::json!({ "label": label }))
}

pub fn catalog_field(ctx: &Context, label: &str) -> Result<(), Error> {
    let field = ctx.registry(Db::in_memory()?)?.catalog_field(label)?;

    print_json(&field.as_ref().map(FieldOutput::from))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use dynabase_core::config::LogConfig;

    #[test]
    fn events_default_to_stderr() {
        let ctx = Context::new(DynabaseConfig::default(), None);

        assert_eq!(ctx.sink().unwrap().name(), "stderr");
    }

    #[test]
    fn configured_log_paths_take_events() {
        let path = std::env::temp_dir().join(format!("dynabase-cli-{}.log", std::process::id()));
        let config = DynabaseConfig {
            log: LogConfig {
                path: Some(path.clone()),
                ..LogConfig::default()
            },
            ..DynabaseConfig::default()
        };

        let sink = Context::new(config, None).sink().unwrap();
        assert_eq!(sink.name(), "file");

        let _ = fs::remove_file(path);
    }
}
