//! Token manager
//!
//! Obtains and refreshes access tokens for a [`SharedCredential`]:
//! - Credentials without a grant type use their pre-set token as-is
//! - A present token is reused unless the caller forces a refresh
//! - Otherwise the token endpoint is called with the credential's grant

use std::sync::Arc;
use std::time::Duration;

use digirest_domain::constants::{
    FIELD_CLIENT_ID, FIELD_CLIENT_SECRET, FIELD_GRANT_TYPE, FIELD_PASSWORD, FIELD_REFRESH_TOKEN,
    FIELD_USERNAME, HEADER_ACCEPT, HEADER_CONTENT_TYPE,
};
use digirest_domain::{
    AuthError, ContentType, Credential, DigirestError, GrantType, OutputFormat, Result, Verb,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::shared::SharedCredential;
use crate::dispatch::body::encode_form_pairs;
use crate::ports::{EncodedBody, Transport, TransportRequest};

/// Token endpoint response (RFC 6749 §5.1 / §5.2)
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Tokens obtained from the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
struct IssuedTokens {
    access_token: String,
    refresh_token: Option<String>,
}

/// Obtains access tokens through the configured grant flow
#[derive(Clone)]
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl TokenManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, timeout: None }
    }

    /// Bound each token endpoint call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Make sure the credential holds an access token.
    ///
    /// Returns a snapshot of the credential after the operation. Calls with
    /// `force == true` always hit the token endpoint (for fetching grants).
    ///
    /// # Errors
    /// - `Config` when the credential cannot be used for a fetch (no token
    ///   and no grant, missing endpoint URL, missing refresh token)
    /// - `Auth(TokenFetch)` when the endpoint call or its response fails;
    ///   the access token is cleared in that case
    #[instrument(skip(self, credential))]
    pub async fn ensure_token(
        &self,
        credential: &SharedCredential,
        force: bool,
    ) -> Result<Credential> {
        {
            let current = credential.read().await;
            if !current.grant_type.can_fetch() {
                if current.has_token() {
                    return Ok(current.clone());
                }
                return Err(DigirestError::config(
                    "an access token is required for a credential without grant type",
                ));
            }
            if current.has_token() && !force {
                return Ok(current.clone());
            }
        }

        let mut guard = credential.write().await;
        // Another task may have fetched while we waited for the write lock.
        if guard.has_token() && !force {
            return Ok(guard.clone());
        }

        let (url, fields) = token_request(&guard)?;
        debug!(grant_type = %guard.grant_type, url = %url, "requesting access token");

        match self.fetch(&url, &fields).await {
            Ok(tokens) => {
                guard.access_token = Some(tokens.access_token);
                if let Some(refresh) = tokens.refresh_token {
                    guard.refresh_token = Some(refresh);
                }
                info!(grant_type = %guard.grant_type, "access token obtained");
                Ok(guard.clone())
            }
            Err(err) => {
                guard.access_token = None;
                warn!(grant_type = %guard.grant_type, error = %err, "access token fetch failed");
                Err(err)
            }
        }
    }

    async fn fetch(&self, url: &str, fields: &[(String, String)]) -> Result<IssuedTokens> {
        let request = TransportRequest {
            url: url.to_string(),
            verb: Verb::Post,
            headers: vec![
                (HEADER_CONTENT_TYPE.to_string(), ContentType::FormUrlEncoded.as_str().to_string()),
                (HEADER_ACCEPT.to_string(), OutputFormat::JSON.as_str().to_string()),
            ],
            body: EncodedBody::Text(encode_form_pairs(fields)),
            timeout: self.timeout,
            output: None,
        };

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::TokenFetch(e.to_string()))?;

        let parsed: TokenEndpointResponse = serde_json::from_slice(&response.body).map_err(|e| {
            AuthError::TokenFetch(format!(
                "unparsable token response (status {}): {e}",
                response.status
            ))
        })?;

        if !(200..300).contains(&response.status) {
            let reason = parsed
                .error_description
                .or(parsed.error)
                .unwrap_or_else(|| "no error description".to_string());
            return Err(AuthError::TokenFetch(format!(
                "token endpoint returned status {}: {reason}",
                response.status
            ))
            .into());
        }

        match parsed.access_token.filter(|token| !token.is_empty()) {
            Some(access_token) => {
                Ok(IssuedTokens { access_token, refresh_token: parsed.refresh_token })
            }
            None => {
                Err(AuthError::TokenFetch("token response has no access_token".to_string()).into())
            }
        }
    }
}

/// Token endpoint URL and form fields for a credential
fn token_request(credential: &Credential) -> Result<(String, Vec<(String, String)>)> {
    let url = credential
        .auth_server_url
        .clone()
        .filter(|url| !url.is_empty())
        .ok_or_else(|| DigirestError::config("authorization server URL is not set"))?;

    let grant = credential
        .grant_type
        .wire_name()
        .ok_or_else(|| DigirestError::config("credential has no grant type"))?;

    let mut fields = vec![
        (FIELD_GRANT_TYPE.to_string(), grant.to_string()),
        (FIELD_CLIENT_ID.to_string(), credential.client_id.clone().unwrap_or_default()),
        (FIELD_CLIENT_SECRET.to_string(), credential.client_secret.clone().unwrap_or_default()),
    ];

    match credential.grant_type {
        GrantType::RefreshToken => {
            let refresh = credential
                .refresh_token
                .clone()
                .filter(|token| !token.is_empty())
                .ok_or_else(|| DigirestError::config("refresh token grant without refresh token"))?;
            fields.push((FIELD_REFRESH_TOKEN.to_string(), refresh));
        }
        GrantType::Password => {
            fields.push((FIELD_USERNAME.to_string(), credential.username.clone().unwrap_or_default()));
            fields.push((FIELD_PASSWORD.to_string(), credential.password.clone().unwrap_or_default()));
        }
        GrantType::ClientCredentials | GrantType::None => {}
    }

    Ok((url, fields))
}
