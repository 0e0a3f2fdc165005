//! Survey domain model

use super::decode;
use super::errors::DecodeError;
use super::ids::ExportTargetId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ENTITY: &str = "Survey";
const UNKNOWN_SURVEY: &str = "Unknown Survey";

/// A survey as listed by the platform
///
/// Immutable once fetched. All downstream joins use
/// [`Survey::platform_form_id`], the export-target id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// Internal survey id
    pub id: i64,

    /// Internal name
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// Export-target id
    pub platform_form_id: ExportTargetId,
}

impl Survey {
    /// Create a new survey
    pub fn new(
        id: i64,
        name: impl Into<String>,
        display_name: impl Into<String>,
        platform_form_id: ExportTargetId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            display_name: display_name.into(),
            platform_form_id,
        }
    }

    /// Decode a survey row from the platform's survey list
    ///
    /// Missing fields take defaults (`0` for ids, `"Unknown Survey"` for
    /// names). A field of the wrong type is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use vibrent_export::domain::Survey;
    /// use serde_json::json;
    ///
    /// let survey = Survey::from_value(&json!({
    ///     "id": 3, "name": "intake", "displayName": "Intake", "platformFormId": 42
    /// })).unwrap();
    /// assert_eq!(survey.platform_form_id.value(), 42);
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let obj = decode::object(value, ENTITY)?;

        Ok(Self {
            id: decode::integer_or(obj, ENTITY, "id", 0)?,
            name: decode::string_or(obj, ENTITY, "name", UNKNOWN_SURVEY)?,
            display_name: decode::string_or(obj, ENTITY, "displayName", UNKNOWN_SURVEY)?,
            platform_form_id: ExportTargetId::new(decode::integer_or(
                obj,
                ENTITY,
                "platformFormId",
                0,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_row() {
        let survey = Survey::from_value(&json!({
            "id": 11,
            "name": "baseline",
            "displayName": "Baseline Questionnaire",
            "platformFormId": 901,
            "extra": "ignored"
        }))
        .unwrap();

        assert_eq!(survey.id, 11);
        assert_eq!(survey.name, "baseline");
        assert_eq!(survey.display_name, "Baseline Questionnaire");
        assert_eq!(survey.platform_form_id, ExportTargetId::new(901));
    }

    #[test]
    fn test_decode_applies_defaults() {
        let survey = Survey::from_value(&json!({"platformFormId": 5})).unwrap();

        assert_eq!(survey.id, 0);
        assert_eq!(survey.name, "Unknown Survey");
        assert_eq!(survey.display_name, "Unknown Survey");
        assert_eq!(survey.platform_form_id.value(), 5);
    }

    #[test]
    fn test_decode_type_mismatch() {
        let err = Survey::from_value(&json!({"platformFormId": "five"})).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                entity: "Survey",
                field: "platformFormId",
                expected: "integer",
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(Survey::from_value(&json!("survey")).is_err());
        assert!(Survey::from_value(&json!(null)).is_err());
    }
}
