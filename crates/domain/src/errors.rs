//! Error types used throughout the client

use std::time::Duration;

use thiserror::Error;

/// Authentication failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential has been configured on the client
    #[error("Credential is required")]
    MissingCredential,

    /// The token endpoint could not be reached or returned an unusable body
    #[error("Token fetch failed: {0}")]
    TokenFetch(String),

    /// The resource endpoint still answered 401 after a forced refresh
    #[error("Access token rejected by the API")]
    TokenRejected,
}

/// Main error type for Digirest
#[derive(Error, Debug)]
pub enum DigirestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// Coarse error categories, used for logging and caller-side decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad configuration or input, detected before any network activity
    Config,
    /// Credential missing or token endpoint failure
    Authentication,
    /// Network or IO failure reported by the transport
    Network,
}

impl DigirestError {
    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Transport(_) | Self::Timeout(_) => ErrorCategory::Network,
        }
    }

    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(AuthError::MissingCredential) => "auth_missing_credential",
            Self::Auth(AuthError::TokenFetch(_)) => "auth_token_fetch",
            Self::Auth(AuthError::TokenRejected) => "auth_token_rejected",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Shorthand for building a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<serde_json::Error> for DigirestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("Failed to encode JSON: {err}"))
    }
}

/// Result type alias for Digirest operations
pub type Result<T> = std::result::Result<T, DigirestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(DigirestError::config("x").category(), ErrorCategory::Config);
        assert_eq!(
            DigirestError::Auth(AuthError::MissingCredential).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(DigirestError::Transport("x".into()).category(), ErrorCategory::Network);
        assert_eq!(
            DigirestError::Timeout(Duration::from_secs(1)).category(),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(DigirestError::config("x").label(), "config");
        assert_eq!(
            DigirestError::Auth(AuthError::TokenFetch("boom".into())).label(),
            "auth_token_fetch"
        );
        assert_eq!(DigirestError::Transport("x".into()).label(), "transport");
    }

    #[test]
    fn test_auth_error_converts() {
        let err: DigirestError = AuthError::TokenRejected.into();
        assert!(matches!(err, DigirestError::Auth(AuthError::TokenRejected)));
        assert_eq!(err.to_string(), "Authentication error: Access token rejected by the API");
    }
}
