//! API response returned to callers

use std::borrow::Cow;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::http::{OutputFormat, Verb};
use crate::errors::{AuthError, DigirestError, Result};

/// Response payload, decoded when possible
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Undecoded bytes, binary payloads included
    Raw(Bytes),
}

/// Outcome of one logical call (including a possible auth retry)
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    /// Body exactly as received
    pub raw_body: Bytes,
    /// `Content-Type` declared by the server
    pub content_type: Option<String>,
    pub body: ResponseBody,
    /// URI of the final attempt
    pub request_uri: String,
    pub verb: Verb,
    /// Number of HTTP attempts made (1, or 2 after a 401 retry)
    pub attempts: u8,
}

impl ApiResponse {
    /// Build a response, decoding JSON when the client asked for JSON, the
    /// server declared JSON and the body was buffered.
    pub fn from_parts(
        status_code: u16,
        raw_body: Bytes,
        content_type: Option<String>,
        format: &OutputFormat,
        immediate_output: bool,
        request_uri: String,
        verb: Verb,
    ) -> Self {
        let body = decode_body(&raw_body, content_type.as_deref(), format, immediate_output);
        Self { status_code, raw_body, content_type, body, request_uri, verb, attempts: 1 }
    }

    /// Legacy success check: any status between 200 and 302 inclusive
    pub fn is_ok(&self) -> bool {
        (200..=302).contains(&self.status_code)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }

    /// Body as text; invalid UTF-8 sequences are replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }

    pub fn json_value(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    /// Deserialize the raw body into `T`
    ///
    /// # Errors
    /// Returns `Config` when the body is not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.raw_body)
            .map_err(|e| DigirestError::config(format!("Failed to parse response: {e}")))
    }

    /// Turn a terminal 401 into an authentication error
    ///
    /// # Errors
    /// Returns `Auth(TokenRejected)` when the status is 401
    pub fn error_for_auth(self) -> Result<Self> {
        if self.is_unauthorized() {
            return Err(AuthError::TokenRejected.into());
        }
        Ok(self)
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|media| media.eq_ignore_ascii_case("application/json"))
}

fn decode_body(
    raw: &Bytes,
    content_type: Option<&str>,
    format: &OutputFormat,
    immediate_output: bool,
) -> ResponseBody {
    let wants_json =
        format.is_json() && !immediate_output && content_type.is_some_and(is_json_media_type);
    if wants_json {
        if let Ok(value) = serde_json::from_slice(raw) {
            return ResponseBody::Json(value);
        }
    }
    ResponseBody::Raw(raw.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(status: u16, body: &str, content_type: Option<&str>, immediate: bool) -> ApiResponse {
        ApiResponse::from_parts(
            status,
            Bytes::copy_from_slice(body.as_bytes()),
            content_type.map(str::to_string),
            &OutputFormat::JSON,
            immediate,
            "https://api.test/sms".to_string(),
            Verb::Get,
        )
    }

    #[test]
    fn test_json_is_decoded_when_declared() {
        let resp = response(200, r#"{"id":1}"#, Some("application/json; charset=utf-8"), false);
        assert_eq!(resp.json_value(), Some(&json!({"id": 1})));
    }

    #[test]
    fn test_body_stays_raw_in_immediate_output_mode() {
        let resp = response(200, r#"{"id":1}"#, Some("application/json"), true);
        assert_eq!(resp.body, ResponseBody::Raw(Bytes::from_static(br#"{"id":1}"#)));
    }

    #[test]
    fn test_body_stays_raw_for_other_content_types() {
        let resp = response(200, "a,b", Some("text/csv"), false);
        assert!(resp.json_value().is_none());
    }

    #[test]
    fn test_unparsable_json_falls_back_to_raw() {
        let resp = response(200, "not json", Some("application/json"), false);
        assert_eq!(resp.body, ResponseBody::Raw(Bytes::from_static(b"not json")));
    }

    #[test]
    fn test_legacy_ok_range() {
        assert!(response(200, "", None, false).is_ok());
        assert!(response(302, "", None, false).is_ok());
        assert!(!response(304, "", None, false).is_ok());
        assert!(!response(401, "", None, false).is_ok());
    }

    #[test]
    fn test_binary_body_is_kept_verbatim() {
        let payload = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0xFF, 0x00, 0xFE]);
        let resp = ApiResponse::from_parts(
            200,
            payload.clone(),
            Some("application/bin".to_string()),
            &OutputFormat::BIN,
            false,
            "https://api.test/files/1".to_string(),
            Verb::Get,
        );

        assert_eq!(resp.raw_body, payload);
        assert_eq!(resp.body, ResponseBody::Raw(payload));
        assert!(resp.text().contains('\u{FFFD}'));
    }

    #[test]
    fn test_error_for_auth() {
        let err = response(401, "", None, false).error_for_auth().unwrap_err();
        assert!(matches!(err, DigirestError::Auth(AuthError::TokenRejected)));
        assert!(response(403, "", None, false).error_for_auth().is_ok());
    }
}
