//! Input validation that collects every failing field instead of stopping at
//! the first problem.
//!
//! Each entity defines a `Create*` input (all mandatory fields required) and
//! an `Update*` input (every field optional, only supplied fields validated).
//! Both run their field checks through a shared [FieldErrors] accumulator.

use std::{collections::BTreeMap, fmt::Display};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::Error;

/// A map from field name to the list of validation messages for that field.
///
/// `finish` converts a non-empty map into [Error::Validation], which renders
/// as a 400 response listing every failing field.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether any field has failed so far.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the accumulated errors into a result.
    pub fn finish(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }

        Ok(())
    }
}

/// Check that `value` is between `min` and `max` characters long (inclusive).
pub fn check_length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let length = value.chars().count();

    if length < min || length > max {
        errors.add(
            field,
            format!("Length must be between {min} and {max} characters"),
        );
    }
}

/// Check that `value` is a positive amount with at most two decimal places.
pub fn check_positive_amount(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value <= Decimal::ZERO {
        errors.add(field, "Amount must be greater than 0");
    }

    check_decimal_places(errors, field, value);
}

/// Check that `value` is a non-negative amount with at most two decimal
/// places.
pub fn check_non_negative_amount(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.add(field, "Amount must not be negative");
    }

    check_decimal_places(errors, field, value);
}

fn check_decimal_places(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value.normalize().scale() > 2 {
        errors.add(field, "Amount must have at most 2 decimal places");
    }
}

/// Check that `value` is a hex color code such as `#6366f1`.
pub fn check_hex_color(errors: &mut FieldErrors, field: &str, value: &str) {
    let mut chars = value.chars();
    let is_valid = value.len() == 7
        && chars.next() == Some('#')
        && chars.all(|c| c.is_ascii_hexdigit());

    if !is_valid {
        errors.add(field, "Must be a hex color code, e.g. #6366f1");
    }
}

/// Check that `value` looks like an email address.
///
/// This intentionally checks shape only (one `@`, non-empty local part, a dot
/// in the domain); deliverability is the mail system's problem.
pub fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    let is_valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };

    if !is_valid {
        errors.add(field, "Not a valid email address");
    }
}

/// Check that an integer `value` is within `min..=max`.
pub fn check_range(errors: &mut FieldErrors, field: &str, value: i32, min: i32, max: i32) {
    if value < min || value > max {
        errors.add(field, format!("Must be between {min} and {max}"));
    }
}

#[cfg(test)]
mod field_errors_tests {
    use rust_decimal::Decimal;

    use crate::Error;

    use super::{
        FieldErrors, check_email, check_hex_color, check_length, check_non_negative_amount,
        check_positive_amount, check_range,
    };

    #[test]
    fn finish_with_no_errors_is_ok() {
        let errors = FieldErrors::new();

        assert_eq!(errors.finish(), Ok(()));
    }

    #[test]
    fn collects_multiple_fields_without_short_circuiting() {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "name", "", 1, 100);
        check_positive_amount(&mut errors, "amount", Decimal::new(-100, 2));

        let result = errors.finish();

        let Err(Error::Validation(field_errors)) = result else {
            panic!("expected a validation error, got {result:?}");
        };
        let rendered = field_errors.to_string();
        assert!(rendered.contains("name"), "missing name error: {rendered}");
        assert!(
            rendered.contains("amount"),
            "missing amount error: {rendered}"
        );
    }

    #[test]
    fn zero_amount_fails() {
        let mut errors = FieldErrors::new();

        check_positive_amount(&mut errors, "amount", Decimal::ZERO);

        assert!(!errors.is_empty());
    }

    #[test]
    fn one_cent_passes() {
        let mut errors = FieldErrors::new();

        check_positive_amount(&mut errors, "amount", Decimal::new(1, 2));

        assert!(errors.is_empty());
    }

    #[test]
    fn three_decimal_places_fail() {
        let mut errors = FieldErrors::new();

        check_positive_amount(&mut errors, "amount", Decimal::new(12345, 3));

        assert!(!errors.is_empty());
    }

    #[test]
    fn trailing_zeroes_beyond_two_places_pass() {
        let mut errors = FieldErrors::new();

        // 1.100 normalizes to 1.1, which is within two decimal places.
        check_positive_amount(&mut errors, "amount", Decimal::new(1100, 3));

        assert!(errors.is_empty());
    }

    #[test]
    fn negative_current_amount_fails() {
        let mut errors = FieldErrors::new();

        check_non_negative_amount(&mut errors, "current_amount", Decimal::new(-1, 2));

        assert!(!errors.is_empty());
    }

    #[test]
    fn zero_current_amount_passes() {
        let mut errors = FieldErrors::new();

        check_non_negative_amount(&mut errors, "current_amount", Decimal::ZERO);

        assert!(errors.is_empty());
    }

    #[test]
    fn valid_hex_color_passes() {
        let mut errors = FieldErrors::new();

        check_hex_color(&mut errors, "color", "#6366f1");

        assert!(errors.is_empty());
    }

    #[test]
    fn hex_color_without_hash_fails() {
        let mut errors = FieldErrors::new();

        check_hex_color(&mut errors, "color", "6366f1f");

        assert!(!errors.is_empty());
    }

    #[test]
    fn hex_color_with_bad_digit_fails() {
        let mut errors = FieldErrors::new();

        check_hex_color(&mut errors, "color", "#6366zz");

        assert!(!errors.is_empty());
    }

    #[test]
    fn plausible_email_passes() {
        let mut errors = FieldErrors::new();

        check_email(&mut errors, "email", "foo@bar.baz");

        assert!(errors.is_empty());
    }

    #[test]
    fn email_without_at_sign_fails() {
        let mut errors = FieldErrors::new();

        check_email(&mut errors, "email", "foobar.baz");

        assert!(!errors.is_empty());
    }

    #[test]
    fn email_with_dotless_domain_fails() {
        let mut errors = FieldErrors::new();

        check_email(&mut errors, "email", "foo@bar");

        assert!(!errors.is_empty());
    }

    #[test]
    fn month_out_of_range_fails() {
        let mut errors = FieldErrors::new();

        check_range(&mut errors, "month", 13, 1, 12);

        assert!(!errors.is_empty());
    }
}
