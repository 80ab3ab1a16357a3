use crate::{
    Deadline,
    field::{
        FieldError, FieldInvariants, FieldMap, Polynomial,
        backend::{FieldBackend, Reduction, sort_roots},
    },
};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};

///
/// TableField
///
/// A reduced field with precomputed invariants and complex roots.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableField {
    pub polynomial: Polynomial,
    pub invariants: FieldInvariants,
    pub roots: Vec<Complex64>,
}

///
/// TableAlias
///
/// Another presentation of a tabulated field, with the map into it.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableAlias {
    pub input: Polynomial,
    pub reduced: Polynomial,
    pub map: FieldMap,
}

///
/// TableDocument
///
/// On-disk JSON shape of a field table.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableDocument {
    #[serde(default)]
    pub fields: Vec<TableField>,
    #[serde(default)]
    pub aliases: Vec<TableAlias>,
}

///
/// TableBackend
///
/// Lookup backend over precomputed fields. Polynomials are matched on their
/// primitive part, so scalar multiples of a tabulated polynomial resolve to
/// the same entry. Misses go to the fallback backend when one is set.
///

#[derive(Default)]
pub struct TableBackend {
    fields: BTreeMap<Polynomial, TableField>,
    aliases: BTreeMap<Polynomial, Reduction>,
    fallback: Option<Arc<dyn FieldBackend>>,
}

impl TableBackend {
    const NAME: &'static str = "table";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FieldBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn from_document(doc: TableDocument) -> Result<Self, FieldError> {
        let mut table = Self::new();
        for field in doc.fields {
            table.insert_field(field)?;
        }
        for alias in doc.aliases {
            table.insert_alias(alias)?;
        }

        Ok(table)
    }

    pub fn from_json(json: &str) -> Result<Self, FieldError> {
        let doc: TableDocument =
            serde_json::from_str(json).map_err(|err| FieldError::InvalidTable {
                message: err.to_string(),
            })?;

        Self::from_document(doc)
    }

    /// Add a reduced field. The polynomial must be monic, the invariants
    /// consistent with its degree, and one root given per degree.
    pub fn insert_field(&mut self, mut field: TableField) -> Result<(), FieldError> {
        let poly = &field.polynomial;
        let invalid = |message: String| FieldError::InvalidTable { message };

        if !poly.is_monic() {
            return Err(invalid(format!("{poly} is not monic")));
        }
        if !field.invariants.is_consistent()
            || usize::try_from(field.invariants.degree).ok() != Some(poly.degree())
        {
            return Err(invalid(format!("inconsistent invariants for {poly}")));
        }
        if field.roots.len() != poly.degree() {
            return Err(invalid(format!(
                "{poly} lists {} roots, expected {}",
                field.roots.len(),
                poly.degree()
            )));
        }

        sort_roots(&mut field.roots);
        self.fields.insert(field.polynomial.clone(), field);

        Ok(())
    }

    /// Add an alias into an already tabulated field. The map is verified in
    /// both directions before it is accepted.
    pub fn insert_alias(&mut self, alias: TableAlias) -> Result<(), FieldError> {
        if !self.fields.contains_key(&alias.reduced) {
            return Err(FieldError::InvalidTable {
                message: format!("alias target {} is not tabulated", alias.reduced),
            });
        }
        if !alias.map.verify(&alias.input, &alias.reduced) {
            return Err(FieldError::InvalidTable {
                message: format!(
                    "map from {} to {} does not preserve roots",
                    alias.input, alias.reduced
                ),
            });
        }

        self.aliases.insert(
            alias.input.primitive_part(),
            Reduction {
                polynomial: alias.reduced,
                map: alias.map,
            },
        );

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn field(&self, poly: &Polynomial) -> Option<&TableField> {
        self.fields.get(&poly.primitive_part())
    }

    fn unknown(poly: &Polynomial) -> FieldError {
        FieldError::UnknownField {
            backend: Self::NAME,
            polynomial: poly.to_string(),
        }
    }
}

impl fmt::Debug for TableBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableBackend")
            .field("fields", &self.fields.len())
            .field("aliases", &self.aliases.len())
            .field("fallback", &self.fallback.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl FieldBackend for TableBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reduce(&self, poly: &Polynomial, deadline: &Deadline) -> Result<Reduction, FieldError> {
        if let Some(field) = self.field(poly) {
            return Ok(Reduction::identity(field.polynomial.clone()));
        }
        if let Some(reduction) = self.aliases.get(&poly.primitive_part()) {
            return Ok(reduction.clone());
        }

        match &self.fallback {
            Some(fallback) => fallback.reduce(poly, deadline),
            None => Err(Self::unknown(poly)),
        }
    }

    fn invariants(
        &self,
        poly: &Polynomial,
        deadline: &Deadline,
    ) -> Result<FieldInvariants, FieldError> {
        if let Some(field) = self.field(poly) {
            return Ok(field.invariants.clone());
        }
        if let Some(field) = self
            .aliases
            .get(&poly.primitive_part())
            .and_then(|r| self.fields.get(&r.polynomial))
        {
            return Ok(field.invariants.clone());
        }

        match &self.fallback {
            Some(fallback) => fallback.invariants(poly, deadline),
            None => Err(Self::unknown(poly)),
        }
    }

    fn complex_roots(&self, poly: &Polynomial) -> Result<Vec<Complex64>, FieldError> {
        if let Some(field) = self.field(poly) {
            return Ok(field.roots.clone());
        }

        match &self.fallback {
            Some(fallback) => fallback.complex_roots(poly),
            None => Err(Self::unknown(poly)),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::NativeBackend, test_support::cubic_table};
    use num_bigint::BigInt;

    fn poly(coeffs: &[i64]) -> Polynomial {
        Polynomial::from_i64s(coeffs).unwrap()
    }

    #[test]
    fn tabulated_fields_reduce_to_themselves() {
        let table = cubic_table();
        let target = poly(&[-28, -21, 0, 1]);

        let reduction = table.reduce(&target, &Deadline::none()).unwrap();
        assert_eq!(reduction.polynomial, target);
        assert!(reduction.map.is_identity());

        let inv = table.invariants(&target, &Deadline::none()).unwrap();
        assert_eq!(inv.discriminant, BigInt::from(3969));
        assert_eq!(inv.conductor, Some(BigInt::from(63)));
    }

    #[test]
    fn aliases_carry_their_map() {
        let table = cubic_table();
        let input = poly(&[28, -21, 0, 1]);

        let reduction = table.reduce(&input, &Deadline::none()).unwrap();
        assert_eq!(reduction.polynomial, poly(&[-28, -21, 0, 1]));
        assert!(!reduction.map.is_identity());
        assert!(reduction.map.verify(&input, &reduction.polynomial));
        assert_eq!(table.invariants(&input, &Deadline::none()).unwrap().class_number, 1);
    }

    #[test]
    fn misses_use_the_fallback() {
        let bare = cubic_table();
        let err = bare.reduce(&poly(&[-8, 0, 1]), &Deadline::none()).unwrap_err();
        assert!(matches!(err, FieldError::UnknownField { backend: "table", .. }));

        let table = cubic_table().with_fallback(Arc::new(NativeBackend));
        let reduction = table.reduce(&poly(&[-8, 0, 1]), &Deadline::none()).unwrap();
        assert_eq!(reduction.polynomial, poly(&[-2, 0, 1]));
    }

    #[test]
    fn rejects_aliases_whose_map_is_wrong() {
        let mut table = cubic_table();
        let alias = TableAlias {
            input: poly(&[28, -21, 0, 1]),
            reduced: poly(&[-28, -21, 0, 1]),
            map: FieldMap::identity(),
        };

        let err = table.insert_alias(alias).unwrap_err();
        assert!(matches!(err, FieldError::InvalidTable { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TableBackend::from_json(r#"{"fields": [], "extra": 1}"#).unwrap_err();

        assert!(matches!(err, FieldError::InvalidTable { .. }));
    }

    #[test]
    fn roots_must_match_the_degree() {
        let mut table = TableBackend::new();
        let field = TableField {
            polynomial: poly(&[-2, 0, 1]),
            invariants: NativeBackend.invariants(&poly(&[-2, 0, 1]), &Deadline::none()).unwrap(),
            roots: vec![Complex64::new(1.414, 0.0)],
        };

        assert!(table.insert_field(field).is_err());
        assert!(table.is_empty());
    }
}
