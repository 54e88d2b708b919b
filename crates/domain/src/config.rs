//! Configuration management

use serde::{Deserialize, Serialize};

use crate::types::{ContentType, Credential, OutputFormat};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API; normalized to end with exactly one `/`
    pub base_url: Option<String>,
    pub format: OutputFormat,
    pub content_type: ContentType,
    /// Forward response bytes to the output sink instead of buffering them
    pub immediate_output: bool,
    pub timeout_secs: Option<u64>,
    /// Headers sent with every request, in order
    pub default_headers: Vec<(String, String)>,
    pub credential: Option<Credential>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            format: OutputFormat::JSON,
            content_type: ContentType::FormUrlEncoded,
            immediate_output: false,
            timeout_secs: None,
            default_headers: Vec::new(),
            credential: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GrantType;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.format, OutputFormat::JSON);
        assert_eq!(config.content_type, ContentType::FormUrlEncoded);
        assert!(!config.immediate_output);
        assert!(config.credential.is_none());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "base_url": "https://api.test/rest",
                "format": "application/xml",
                "credential": {
                    "grant_type": "client_credentials",
                    "auth_server_url": "https://auth.test/token",
                    "client_id": "id",
                    "client_secret": "secret"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.format, OutputFormat::XML);
        let credential = config.credential.unwrap();
        assert_eq!(credential.grant_type, GrantType::ClientCredentials);
        assert_eq!(credential.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let result: Result<ClientConfig, _> = serde_json::from_str(r#"{"format": "text/plain"}"#);
        assert!(result.is_err());
    }
}
