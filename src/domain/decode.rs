//! Field accessors for decoding platform JSON payloads
//!
//! Missing and `null` fields fall back to the caller's default; a field that
//! is present with the wrong JSON type is a [`DecodeError::TypeMismatch`].

use super::errors::DecodeError;
use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

pub(crate) fn object<'a>(value: &'a Value, entity: &'static str) -> Result<&'a Object, DecodeError> {
    value
        .as_object()
        .ok_or(DecodeError::NotAnObject { entity })
}

fn present<'a>(obj: &'a Object, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

pub(crate) fn integer_or(
    obj: &Object,
    entity: &'static str,
    field: &'static str,
    default: i64,
) -> Result<i64, DecodeError> {
    match present(obj, field) {
        None => Ok(default),
        Some(v) => v.as_i64().ok_or(DecodeError::TypeMismatch {
            entity,
            field,
            expected: "integer",
        }),
    }
}

pub(crate) fn string_or(
    obj: &Object,
    entity: &'static str,
    field: &'static str,
    default: &str,
) -> Result<String, DecodeError> {
    Ok(optional_string(obj, entity, field)?.unwrap_or_else(|| default.to_string()))
}

pub(crate) fn optional_string(
    obj: &Object,
    entity: &'static str,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::TypeMismatch {
            entity,
            field,
            expected: "string",
        }),
    }
}

/// Like [`optional_string`] but also accepts numbers (timestamps are sent
/// either as ISO strings or as epoch milliseconds).
pub(crate) fn optional_text(
    obj: &Object,
    entity: &'static str,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(DecodeError::TypeMismatch {
            entity,
            field,
            expected: "string or number",
        }),
    }
}
