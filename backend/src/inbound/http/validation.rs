//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde_json::json;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_field_error(field: FieldName, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": ErrorCode::InvalidValue.as_str(),
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse a UUID-backed identifier from a path segment or body field.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
{
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

/// Unwrap a required body field, treating blank strings as missing.
pub(crate) fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerId, ErrorCode as DomainCode};
    use rstest::rstest;
    use serde_json::Value;

    const FIELD: FieldName = FieldName::new("customerId");

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_owned()))]
    fn blank_required_values_are_missing(#[case] value: Option<String>) {
        let err = required(value, FieldName::new("name")).expect_err("missing");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details.get("field").and_then(Value::as_str), Some("name"));
        assert_eq!(
            details.get("code").and_then(Value::as_str),
            Some("missing_field")
        );
    }

    #[test]
    fn parse_id_accepts_uuid() {
        let id: CustomerId =
            parse_id("3fa85f64-5717-4562-b3fc-2c963f66afa6", FIELD).expect("valid");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[test]
    fn parse_id_reports_field_and_value() {
        let err = parse_id::<CustomerId>("42", FIELD).expect_err("not a uuid");
        assert_eq!(err.message(), "customerId must be a valid UUID");
        let details = err.details().expect("details");
        assert_eq!(details.get("value").and_then(Value::as_str), Some("42"));
        assert_eq!(
            details.get("code").and_then(Value::as_str),
            Some("invalid_uuid")
        );
    }
}
