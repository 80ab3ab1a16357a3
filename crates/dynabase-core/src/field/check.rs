use crate::{
    Deadline,
    field::{CANONICAL_GENERATOR, Field, FieldBackend, FieldError},
};

/// Whether `field` is already in canonical form.
///
/// The rational field is always canonical and relative extensions never are.
/// An absolute field is canonical when its generator is named
/// [`CANONICAL_GENERATOR`] and its defining polynomial is coefficient-equal to
/// its own reduction. Fields that are not number fields are an error, not
/// `false`.
pub fn is_normalized(
    backend: &dyn FieldBackend,
    field: &Field,
    deadline: &Deadline,
) -> Result<bool, FieldError> {
    match field {
        Field::Rational => Ok(true),
        Field::Relative(_) => Ok(false),
        Field::Finite(_) => Err(FieldError::NotANumberField {
            field: field.to_string(),
        }),
        Field::Absolute(nf) => {
            if nf.generator() != CANONICAL_GENERATOR {
                return Ok(false);
            }
            let reduction = backend.reduce(nf.polynomial(), deadline)?;

            Ok(reduction.polynomial == *nf.polynomial())
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorClass,
        field::{FiniteField, NativeBackend, Polynomial, RelativeField},
        test_support::cubic_table,
    };

    #[test]
    fn rational_field_is_normalized() {
        assert!(is_normalized(&NativeBackend, &Field::Rational, &Deadline::none()).unwrap());
    }

    #[test]
    fn non_canonical_generator_is_not_normalized() {
        // x^2 - 2 is already reduced; only the generator name is off.
        let field = Field::number_field(&[-2, 0, 1], "b").unwrap();

        assert!(!is_normalized(&NativeBackend, &field, &Deadline::none()).unwrap());
    }

    #[test]
    fn unreduced_polynomial_is_not_normalized() {
        let field = Field::quadratic(8).unwrap();

        assert!(!is_normalized(&NativeBackend, &field, &Deadline::none()).unwrap());
        let canonical = Field::quadratic(2).unwrap();
        assert!(is_normalized(&NativeBackend, &canonical, &Deadline::none()).unwrap());
    }

    #[test]
    fn relative_extensions_are_not_normalized() {
        let field = Field::Relative(RelativeField {
            base: Box::new(Field::quadratic(2).unwrap()),
            polynomial: Polynomial::from_i64s(&[-3, 0, 1]).unwrap(),
            generator: "a".to_string(),
        });

        assert!(!is_normalized(&NativeBackend, &field, &Deadline::none()).unwrap());
    }

    #[test]
    fn finite_fields_are_an_error() {
        let field = Field::Finite(FiniteField {
            characteristic: 3,
            degree: 1,
        });

        let err = is_normalized(&NativeBackend, &field, &Deadline::none()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotANumberField);
    }

    #[test]
    fn tabulated_cubics_are_normalized() {
        let table = cubic_table();

        let reduced = Field::number_field(&[-28, -21, 0, 1], "a").unwrap();
        let alias = Field::number_field(&[28, -21, 0, 1], "a").unwrap();

        assert!(is_normalized(&table, &reduced, &Deadline::none()).unwrap());
        assert!(!is_normalized(&table, &alias, &Deadline::none()).unwrap());
    }

    #[test]
    fn wide_discriminants_fail_fast() {
        // x^2 - (2^89 - 1)
        let mersenne: num_bigint::BigInt = (num_bigint::BigInt::from(1) << 89) - 1;
        let poly = Polynomial::new(vec![-mersenne, 0.into(), 1.into()]).unwrap();
        let field = Field::Absolute(crate::field::NumberField::new(poly, "a").unwrap());

        let started = std::time::Instant::now();
        let err = is_normalized(&NativeBackend, &field, &Deadline::none()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::ReductionUnavailable);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
