//! Custom scalars for date, time and binary fields.
//!
//! Values travel as strings: ISO 8601 for `Date`, `Time` and `DateTime`,
//! standard base64 for `Base64`. Input values are checked against these
//! formats before any resolver runs.

use std::sync::LazyLock;

use async_graphql::Value;
use async_graphql::dynamic::{Scalar, SchemaBuilder};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use strawchemy_core::ScalarType;

/// ISO 8601 calendar date: YYYY-MM-DD
static DATE_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])$").expect("Invalid date regex")
});

/// ISO 8601 time: hh:mm[:ss[.fff]]
static TIME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9](\.[0-9]+)?)?$").expect("Invalid time regex")
});

/// ISO 8601 date-time with optional seconds and offset.
static DATETIME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])[T ]([01][0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9](\.[0-9]+)?)?(Z|[+-]([01][0-9]|2[0-3]):?[0-5][0-9])?$",
    )
    .expect("Invalid dateTime regex")
});

pub fn is_valid_date(value: &Value) -> bool {
    matches!(value, Value::String(s) if DATE_REGEX.is_match(s))
}

pub fn is_valid_time(value: &Value) -> bool {
    matches!(value, Value::String(s) if TIME_REGEX.is_match(s))
}

pub fn is_valid_datetime(value: &Value) -> bool {
    matches!(value, Value::String(s) if DATETIME_REGEX.is_match(s))
}

pub fn is_valid_base64(value: &Value) -> bool {
    matches!(value, Value::String(s) if STANDARD.decode(s).is_ok())
}

/// Registers every custom scalar named by [`ScalarType::graphql_name`].
pub(crate) fn register_scalars(builder: SchemaBuilder) -> SchemaBuilder {
    let scalars = [
        (
            ScalarType::Date,
            "A calendar date (YYYY-MM-DD)",
            is_valid_date as fn(&Value) -> bool,
        ),
        (ScalarType::Time, "A time of day (hh:mm:ss)", is_valid_time),
        (
            ScalarType::DateTime,
            "A date and time (YYYY-MM-DDThh:mm:ss with optional offset)",
            is_valid_datetime,
        ),
        (ScalarType::Binary, "Base64-encoded binary data", is_valid_base64),
    ];

    let mut builder = builder;
    for (scalar, description, validator) in scalars {
        builder = builder.register(
            Scalar::new(scalar.graphql_name())
                .description(description)
                .validator(validator),
        );
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    #[test]
    fn test_date() {
        assert!(is_valid_date(&s("2024-01-15")));
        assert!(!is_valid_date(&s("2024-13-01")));
        assert!(!is_valid_date(&s("2024-01-15T10:00:00")));
        assert!(!is_valid_date(&Value::Number(20240115.into())));
    }

    #[test]
    fn test_time() {
        assert!(is_valid_time(&s("10:30")));
        assert!(is_valid_time(&s("10:30:15.250")));
        assert!(!is_valid_time(&s("24:00:00")));
    }

    #[test]
    fn test_datetime() {
        assert!(is_valid_datetime(&s("2024-01-15T10:30:00")));
        assert!(is_valid_datetime(&s("2024-01-15T10:30:00Z")));
        assert!(is_valid_datetime(&s("2024-01-15 10:30:00+01:00")));
        assert!(!is_valid_datetime(&s("2024-01-15")));
    }

    #[test]
    fn test_base64() {
        assert!(is_valid_base64(&s("aGVsbG8=")));
        assert!(!is_valid_base64(&s("not base64!")));
    }
}
