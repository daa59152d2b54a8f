// Master data
pub mod customers;
pub mod materials;

// Stock and billing workflows
pub mod orders;
pub mod stock;
pub mod usage;

// Store-to-store data copy used by the migration CLI
pub mod transfer;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Trims an optional text field and drops it when nothing is left.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn ensure_positive(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

/// Maps a foreign-key violation raised by a delete to `Conflict`; other store
/// errors pass through unchanged.
pub(crate) fn conflict_on_reference(err: DbErr, message: impl FnOnce() -> String) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::Conflict(message()),
        _ => ServiceError::DatabaseError(err),
    }
}

/// Line total for `quantity` units at `unit_price`.
pub fn line_total(unit_price: Decimal, quantity: Decimal) -> Result<Decimal, ServiceError> {
    unit_price.checked_mul(quantity).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "line total overflows for price {} and quantity {}",
            unit_price, quantity
        ))
    })
}

/// Sum of line totals, failing instead of overflowing.
pub fn checked_total<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| ServiceError::ValidationError("total overflows".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.00), dec!(3), dec!(30.00))]
    #[case(dec!(8.5), dec!(2.5), dec!(21.25))]
    #[case(dec!(0), dec!(12), dec!(0))]
    fn line_total_multiplies_price_by_quantity(
        #[case] price: Decimal,
        #[case] quantity: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(line_total(price, quantity).unwrap(), expected);
    }

    #[test]
    fn line_total_reports_overflow() {
        assert_matches!(
            line_total(Decimal::MAX, dec!(2)),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_strings_are_rejected(#[case] value: &str) {
        assert!(validate_not_blank(value).is_err());
    }

    #[test]
    fn optional_fields_are_trimmed() {
        assert_eq!(normalize_optional(Some("  a@b.io ".into())), Some("a@b.io".into()));
        assert_eq!(normalize_optional(Some("   ".into())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn non_positive_quantities_fail() {
        assert_matches!(
            ensure_positive("quantity", dec!(0)),
            Err(ServiceError::ValidationError(msg)) if msg.contains("quantity")
        );
        assert!(ensure_positive("quantity", dec!(0.001)).is_ok());
    }

    #[test]
    fn checked_total_sums_and_reports_overflow() {
        assert_eq!(checked_total(Vec::<Decimal>::new()).unwrap(), Decimal::ZERO);
        assert_eq!(
            checked_total([dec!(30), dec!(10), dec!(0.25)]).unwrap(),
            dec!(40.25)
        );
        assert_matches!(
            checked_total([Decimal::MAX, Decimal::ONE]),
            Err(ServiceError::ValidationError(_))
        );
    }
}
