//! Caller-facing registry.
//!
//! [`Registry`] ties the normalizer, the label allocator and the field
//! repository together behind one session over an explicit [`Db`] handle.


use crate::{
    Deadline, Error,
    catalog::LabelResolver,
    config::{CatalogPolicy, ConfigError, DynabaseConfig, RegistryConfig},
    db::{
        Db,
        StoreError,
        repository::{self, COEFFICIENTS_CONSTRAINT, FieldRepository, NumberFieldRecord},
        schema::NUMBER_FIELDS,
    },
    field::{
        self, Field, FieldBackend, FieldError, FieldInvariants, Normalized, Polynomial,
    },
    label::{Label, LabelError, LabelPrefix, allocate_label},
    obs::{Event, EventSink, NullSink},
};
use num_complex::Complex64;
use rusqlite::Transaction;
use std::{sync::Arc, time::Duration};

///
/// Registry
///
/// Session over a store and a reduction backend.
///

#[derive(Clone)]
pub struct Registry {
    db: Db,
    backend: Arc<dyn FieldBackend>,
    resolver: Option<Arc<dyn LabelResolver>>,
    sink: Arc<dyn EventSink>,
    config: RegistryConfig,
    catalog_timeout: Duration,
    debug: bool,
}

impl Registry {
    #[must_use]
    pub fn new(db: Db, backend: Arc<dyn FieldBackend>) -> Self {
        Self {
            db,
            backend,
            resolver: None,
            sink: Arc::new(NullSink),
            config: RegistryConfig::default(),
            catalog_timeout: DynabaseConfig::default().catalog.timeout(),
            debug: false,
        }
    }

    /// Print `[debug]` lines to stderr for every stage of subsequent calls.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Catalog consulted when the policy is [`CatalogPolicy::Advisory`] and
    /// by [`catalog_field`](Self::catalog_field).
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn LabelResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    /// Apply the `[registry]`, `[catalog]` and `[log]` sections that do not
    /// need I/O. Sinks and resolvers are attached by the caller.
    #[must_use]
    pub fn configured(self, config: &DynabaseConfig) -> Self {
        let registry = self
            .config(config.registry.clone())
            .catalog_timeout(config.catalog.timeout());

        if config.log.debug {
            registry.debug()
        } else {
            registry
        }
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    #[must_use]
    pub fn repository(&self) -> FieldRepository {
        FieldRepository::new(self.db.clone())
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            eprintln!("[debug] {}", s.into());
        }
    }

    fn emit(&self, event: &Event) {
        self.debug_log(event.to_string());
        self.sink.record(event);
    }

    //
    // Normalization
    //

    /// Canonical presentation of `field` and the map into it, within the
    /// configured timeout.
    pub fn normalize(
        &self,
        field: &Field,
        embedding: Option<Complex64>,
    ) -> Result<Normalized, Error> {
        self.normalize_until(field, embedding, &Deadline::after(self.config.timeout()))
    }

    fn normalize_until(
        &self,
        field: &Field,
        embedding: Option<Complex64>,
        deadline: &Deadline,
    ) -> Result<Normalized, Error> {
        let out = field::normalize(self.backend.as_ref(), field, embedding, deadline)?;

        let renamed = out.map.is_identity()
            && *field != out.field
            && field.defining_polynomial() == out.field.defining_polynomial();
        if renamed && let Field::Absolute(nf) = &out.field {
            self.emit(&Event::GeneratorRenamed {
                field: field.to_string(),
                generator: nf.generator().to_string(),
            });
        } else {
            self.emit(&Event::Normalized {
                input: field.to_string(),
                output: out.field.to_string(),
            });
        }

        Ok(out)
    }

    /// Whether `field` is canonical, within the configured timeout.
    pub fn is_normalized(&self, field: &Field) -> Result<bool, Error> {
        self.is_normalized_until(field, &Deadline::after(self.config.timeout()))
    }

    fn is_normalized_until(&self, field: &Field, deadline: &Deadline) -> Result<bool, Error> {
        Ok(field::is_normalized(
            self.backend.as_ref(),
            field,
            deadline,
        )?)
    }

    //
    // Registration
    //

    /// Register `field`, returning its committed label. Uses the configured
    /// timeout, if any.
    pub fn register(&self, field: &Field, normalize_if_needed: bool) -> Result<Label, Error> {
        self.register_until(field, normalize_if_needed, Deadline::after(self.config.timeout()))
    }

    /// Register `field`, failing with a timeout and committing nothing once
    /// `timeout` has elapsed.
    pub fn register_with_timeout(
        &self,
        field: &Field,
        normalize_if_needed: bool,
        timeout: Duration,
    ) -> Result<Label, Error> {
        self.register_until(field, normalize_if_needed, Deadline::after(Some(timeout)))
    }

    /// Register with the configured `normalize_if_needed` policy.
    pub fn register_default(&self, field: &Field) -> Result<Label, Error> {
        self.register(field, self.config.normalize_if_needed)
    }

    fn register_until(
        &self,
        field: &Field,
        normalize_if_needed: bool,
        deadline: Deadline,
    ) -> Result<Label, Error> {
        self.debug_log(format!("Adding field: {field}"));

        deadline.check("normalization check")?;
        let canonical = if self.is_normalized_until(field, &deadline)? {
            field.clone()
        } else if normalize_if_needed {
            deadline.check("normalization")?;
            self.normalize_until(field, None, &deadline)?.field
        } else {
            return Err(Error::not_normalized(field));
        };

        let polynomial =
            canonical
                .defining_polynomial()
                .ok_or_else(|| FieldError::UnsupportedFieldKind {
                    field: canonical.to_string(),
                })?;

        deadline.check("invariant computation")?;
        let invariants = self.invariants(&canonical, &polynomial, &deadline)?;

        let external = self.consult_catalog(&canonical, deadline)?;

        // The immediate transaction holds the database write lock from the
        // ordinal read to the commit, across every handle on the file.
        deadline.check("label allocation")?;
        let wait = deadline.clamp(self.db.busy_timeout());
        let label = self.db.write_within(wait, |tx| {
            let label = self.insert_new(tx, &canonical, &polynomial, &invariants)?;
            deadline.check("commit")?;

            Ok(label)
        })?;
        self.emit(&Event::FieldInserted {
            label: label.to_string(),
        });

        if let Some((catalog, external)) = external {
            self.compare_with_catalog(catalog, external, &label);
        }

        Ok(label)
    }

    // Rational invariants are fixed; everything else comes from the backend
    // and must agree with the polynomial it was asked about.
    fn invariants(
        &self,
        field: &Field,
        polynomial: &Polynomial,
        deadline: &Deadline,
    ) -> Result<FieldInvariants, Error> {
        if matches!(field, Field::Rational) {
            return Ok(FieldInvariants::rational());
        }

        let invariants = self.backend.invariants(polynomial, deadline)?;
        let degree_matches = usize::try_from(invariants.degree).ok() == Some(polynomial.degree());
        if !invariants.is_consistent() || !degree_matches {
            return Err(FieldError::BackendContract {
                backend: self.backend.name(),
                message: format!("inconsistent invariants reported for {polynomial}"),
            }
            .into());
        }

        Ok(invariants)
    }

    // Runs inside the write transaction. A failed insert undoes only its own
    // statement, so later attempts share the transaction.
    fn insert_new(
        &self,
        tx: &Transaction<'_>,
        field: &Field,
        polynomial: &Polynomial,
        invariants: &FieldInvariants,
    ) -> Result<Label, Error> {
        if let Some(existing) = repository::record_by_coefficients(tx, polynomial.coefficients())? {
            self.emit(&Event::DuplicateRejected {
                field: field.to_string(),
                existing: existing.label.clone(),
            });

            return Err(StoreError::UniqueViolation {
                table: NUMBER_FIELDS.to_string(),
                constraint: COEFFICIENTS_CONSTRAINT.to_string(),
                columns: vec!["defn_poly_coeffs".to_string()],
            }
            .into());
        }

        let mut label = allocate_label(tx, invariants)?;
        let max_attempts = self.config.max_label_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.emit(&Event::LabelComputed {
                prefix: label.prefix().to_string(),
                label: label.to_string(),
            });

            let record = NumberFieldRecord::new(&label, polynomial, invariants);
            match repository::insert_record(tx, &record) {
                Ok(committed) => return Ok(committed),
                Err(err) if repository::is_label_conflict(&err) && !label.is_rational() => {
                    self.debug_log(format!(
                        "label {label} taken (attempt {attempt}/{max_attempts})"
                    ));
                    label = label.successor();
                }
                Err(err) => return Err(err),
            }
        }

        Err(LabelError::Exhausted {
            prefix: LabelPrefix::from_invariants(invariants).to_string(),
            attempts: max_attempts,
        }
        .into())
    }

    //
    // Catalog
    //

    fn consult_catalog(
        &self,
        field: &Field,
        deadline: Deadline,
    ) -> Result<Option<(&'static str, Option<String>)>, Error> {
        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };
        if self.config.catalog != CatalogPolicy::Advisory {
            return Ok(None);
        }

        deadline.check("catalog lookup")?;
        let found = resolver.resolve_label(field, deadline.clamp(self.catalog_timeout))?;
        self.debug_log(format!(
            "catalog {} returned {}",
            resolver.name(),
            found.as_deref().unwrap_or("no label")
        ));

        Ok(Some((resolver.name(), found)))
    }

    fn compare_with_catalog(&self, catalog: &'static str, external: Option<String>, local: &Label) {
        let Some(external) = external else {
            return;
        };
        let local = local.to_string();

        if external == local {
            self.emit(&Event::CatalogMatch {
                catalog,
                label: local,
            });
        } else {
            self.emit(&Event::CatalogMismatch {
                catalog,
                external,
                local,
            });
        }
    }

    /// Field the configured catalog lists under `label`.
    pub fn catalog_field(&self, label: &str) -> Result<Option<Field>, Error> {
        let resolver = self.resolver.as_ref().ok_or_else(|| ConfigError::Invalid {
            key: "catalog",
            message: "no catalog configured".to_string(),
        })?;

        resolver.resolve_field(label, self.catalog_timeout)
    }

    //
    // Records
    //

    /// Delete the field with `label`. Exactly one row is removed.
    pub fn unregister(&self, label: &str) -> Result<usize, Error> {
        label.parse::<Label>()?;
        let rows = self.db.write(|tx| repository::delete_record(tx, label))?;

        self.emit(&Event::FieldDeleted {
            label: label.to_string(),
            rows,
        });

        Ok(rows)
    }

    pub fn lookup(&self, label: &str) -> Result<Option<NumberFieldRecord>, Error> {
        self.db.read(|conn| repository::record_by_label(conn, label))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("backend", &self.backend.name())
            .field("resolver", &self.resolver.as_ref().map(|r| r.name()))
            .field("config", &self.config)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
