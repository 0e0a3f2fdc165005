//! Wire models of the platform's token and export endpoints
//!
//! Survey rows and job status payloads are decoded by the domain decoders
//! ([`crate::domain::Survey::from_value`], [`crate::domain::ExportStatus::from_value`]);
//! only the small fixed-shape responses live here.

use serde::Deserialize;

/// Token endpoint response (client-credentials grant)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    #[serde(default)]
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

/// Response of an export request
#[derive(Debug, Deserialize)]
pub struct ExportIdResponse {
    /// Job id assigned by the platform
    #[serde(rename = "exportId", default)]
    pub export_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserialization() {
        let json = serde_json::json!({
            "access_token": "abc",
            "expires_in": 1800,
            "token_type": "Bearer"
        });

        let response: TokenResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.access_token.as_deref(), Some("abc"));
        assert_eq!(response.expires_in, Some(1800));
    }

    #[test]
    fn test_token_response_without_expiry() {
        let response: TokenResponse =
            serde_json::from_value(serde_json::json!({"access_token": "abc"})).unwrap();
        assert!(response.expires_in.is_none());
    }

    #[test]
    fn test_export_id_response() {
        let response: ExportIdResponse =
            serde_json::from_value(serde_json::json!({"exportId": "exp-7", "status": "SUBMITTED"}))
                .unwrap();
        assert_eq!(response.export_id.as_deref(), Some("exp-7"));

        let empty: ExportIdResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.export_id.is_none());
    }
}
