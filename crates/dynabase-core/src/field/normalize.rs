use crate::{
    Deadline,
    field::{
        CANONICAL_GENERATOR, Field, FieldBackend, FieldError, FieldMap, NumberField, Polynomial,
    },
};
use num_complex::Complex64;

///
/// Normalized
///
/// Canonical field plus the isomorphism from the presented field into it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub field: Field,
    pub map: FieldMap,
}

impl Normalized {
    fn unchanged(field: Field) -> Self {
        Self {
            field,
            map: FieldMap::identity(),
        }
    }

    /// Whether normalization left the presentation as it was.
    #[must_use]
    pub fn is_unchanged(&self, input: &Field) -> bool {
        self.map.is_identity() && self.field == *input
    }
}

/// Reduce `field` to its canonical presentation.
///
/// The embedding of the result is, in order of preference: the caller's
/// `embedding` carried through the map, the field's own embedding carried
/// through the map, or the first complex root of the reduced polynomial in
/// the backend's root order.
///
/// The backend polls `deadline` while it reduces.
pub fn normalize(
    backend: &dyn FieldBackend,
    field: &Field,
    embedding: Option<Complex64>,
    deadline: &Deadline,
) -> Result<Normalized, FieldError> {
    let nf = match field {
        Field::Rational => return Ok(Normalized::unchanged(Field::Rational)),
        Field::Absolute(nf) => nf,
        Field::Relative(_) | Field::Finite(_) => {
            return Err(FieldError::UnsupportedFieldKind {
                field: field.to_string(),
            });
        }
    };

    let reduction = backend.reduce(nf.polynomial(), deadline)?;
    if !reduction.map.verify(nf.polynomial(), &reduction.polynomial) {
        return Err(FieldError::BackendContract {
            backend: backend.name(),
            message: format!(
                "map from {} to {} does not preserve roots",
                nf.polynomial(),
                reduction.polynomial
            ),
        });
    }

    let source_embedding = embedding.or_else(|| nf.embedding());

    if reduction.polynomial != *nf.polynomial() {
        let target_embedding = match source_embedding {
            Some(z) => reduction.map.transport(z),
            None => first_root(backend, &reduction.polynomial)?,
        };
        let reduced = NumberField::new(reduction.polynomial, CANONICAL_GENERATOR)?
            .with_embedding(target_embedding);

        return Ok(Normalized {
            field: reduced.into(),
            map: reduction.map,
        });
    }

    if nf.generator() != CANONICAL_GENERATOR {
        let mut renamed = nf.clone().renamed(CANONICAL_GENERATOR);
        if let Some(z) = source_embedding {
            renamed = renamed.with_embedding(z);
        }

        return Ok(Normalized {
            field: renamed.into(),
            map: FieldMap::identity(),
        });
    }

    Ok(Normalized::unchanged(field.clone()))
}

fn first_root(backend: &dyn FieldBackend, poly: &Polynomial) -> Result<Complex64, FieldError> {
    backend
        .complex_roots(poly)?
        .first()
        .copied()
        .ok_or_else(|| FieldError::BackendContract {
            backend: backend.name(),
            message: format!("no complex roots reported for {poly}"),
        })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        field::{FiniteField, NativeBackend, RelativeField},
        test_support::cubic_table,
    };
    use proptest::prelude::*;

    fn absolute(field: &Field) -> &NumberField {
        match field {
            Field::Absolute(nf) => nf,
            other => panic!("expected an absolute field, got {other}"),
        }
    }

    #[test]
    fn sqrt_eight_reduces_to_sqrt_two() {
        let input = Field::number_field(&[-8, 0, 1], "b").unwrap();

        let out = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();
        let nf = absolute(&out.field);

        assert_eq!(nf.polynomial(), &Polynomial::from_i64s(&[-2, 0, 1]).unwrap());
        assert_eq!(nf.generator(), "a");
        assert!(!out.map.is_identity());

        // First root in (re, im) order is -sqrt(2).
        let z = nf.embedding().unwrap();
        assert!((z.re + 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn embeddings_are_transported() {
        let input = Field::number_field(&[-8, 0, 1], "b").unwrap();
        let sqrt8 = Complex64::new(8f64.sqrt(), 0.0);

        let out = normalize(&NativeBackend, &input, Some(sqrt8), &Deadline::none()).unwrap();
        let z = absolute(&out.field).embedding().unwrap();

        assert!((z.re - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn field_embedding_is_used_when_caller_gives_none() {
        let nf = NumberField::new(Polynomial::from_i64s(&[4, 0, 1]).unwrap(), "w")
            .unwrap()
            .with_embedding(Complex64::new(0.0, 2.0));

        let out = normalize(&NativeBackend, &nf.into(), None, &Deadline::none()).unwrap();
        let reduced = absolute(&out.field);

        assert_eq!(reduced.polynomial(), &Polynomial::from_i64s(&[1, 0, 1]).unwrap());
        let z = reduced.embedding().unwrap();
        assert!(z.re.abs() < 1e-12);
        assert!((z.im - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reduced_polynomial_with_other_generator_is_renamed() {
        let input = Field::number_field(&[-2, 0, 1], "t").unwrap();

        let out = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();
        let nf = absolute(&out.field);

        assert_eq!(nf.generator(), "a");
        assert_eq!(nf.polynomial(), &Polynomial::from_i64s(&[-2, 0, 1]).unwrap());
        assert!(out.map.is_identity());
        assert!(nf.embedding().is_none());
    }

    #[test]
    fn canonical_input_is_returned_unchanged() {
        let input = Field::quadratic(-5).unwrap();

        let out = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();

        assert!(out.is_unchanged(&input));
    }

    #[test]
    fn rational_field_is_canonical() {
        let out = normalize(&NativeBackend, &Field::Rational, None, &Deadline::none()).unwrap();

        assert_eq!(out.field, Field::Rational);
        assert!(out.map.is_identity());
    }

    #[test]
    fn relative_and_finite_fields_are_unsupported() {
        let rel = Field::Relative(RelativeField {
            base: Box::new(Field::quadratic(2).unwrap()),
            polynomial: Polynomial::from_i64s(&[-3, 0, 1]).unwrap(),
            generator: "b".to_string(),
        });
        let finite = Field::Finite(FiniteField {
            characteristic: 7,
            degree: 2,
        });

        for field in [rel, finite] {
            let err = normalize(&NativeBackend, &field, None, &Deadline::none()).unwrap_err();
            assert!(matches!(err, FieldError::UnsupportedFieldKind { .. }));
        }
    }

    #[test]
    fn cubic_alias_normalizes_through_the_table() {
        let input = Field::number_field(&[28, -21, 0, 1], "c").unwrap();

        let out = normalize(&cubic_table(), &input, None, &Deadline::none()).unwrap();
        let nf = absolute(&out.field);

        assert_eq!(nf.polynomial(), &Polynomial::from_i64s(&[-28, -21, 0, 1]).unwrap());
        let z = nf.embedding().unwrap();
        assert!((z.re + 3.651_205_171_769_769_6).abs() < 1e-9);
    }

    fn quadratic_input() -> impl Strategy<Value = (i64, i64, i64)> {
        (-40i64..=40, -40i64..=40, 1i64..=6)
            .prop_filter("irreducible", |&(n, m, l)| {
                let delta = m * m - 4 * l * n;
                delta != 0 && (delta < 0 || delta.isqrt().pow(2) != delta)
            })
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent((n, m, l) in quadratic_input()) {
            let input = Field::number_field(&[n, m, l], "t").unwrap();

            let once = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();
            let twice = normalize(&NativeBackend, &once.field, None, &Deadline::none()).unwrap();

            prop_assert!(twice.is_unchanged(&once.field));
        }

        #[test]
        fn normalization_is_deterministic((n, m, l) in quadratic_input()) {
            let input = Field::number_field(&[n, m, l], "t").unwrap();

            let first = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();
            let second = normalize(&NativeBackend, &input, None, &Deadline::none()).unwrap();

            prop_assert_eq!(
                first.field.defining_polynomial(),
                second.field.defining_polynomial()
            );
            prop_assert_eq!(first.map, second.map);
        }
    }
}
