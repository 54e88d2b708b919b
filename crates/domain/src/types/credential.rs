//! OAuth credential value object
//!
//! A credential carries the grant parameters used to obtain a token plus the
//! current token state. Only the token manager mutates `access_token` and
//! `refresh_token` after construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DigirestError;

/// OAuth 2.0 flow used to obtain an access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GrantType {
    /// Pre-supplied bearer token, no refresh capability
    #[default]
    None,
    ClientCredentials,
    RefreshToken,
    Password,
}

impl GrantType {
    /// Value sent as `grant_type` to the token endpoint
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::ClientCredentials => Some("client_credentials"),
            Self::RefreshToken => Some("refresh_token"),
            Self::Password => Some("password"),
        }
    }

    /// Whether a token can be fetched from an authorization server
    pub fn can_fetch(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name().unwrap_or("none"))
    }
}

impl FromStr for GrantType {
    type Err = DigirestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "client_credentials" => Ok(Self::ClientCredentials),
            "refresh_token" => Ok(Self::RefreshToken),
            "password" => Ok(Self::Password),
            other => Err(DigirestError::config(format!("unsupported grant type: {other}"))),
        }
    }
}

impl Serialize for GrantType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GrantType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Grant parameters and current token state
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credential {
    /// Authorization server token endpoint
    pub auth_server_url: Option<String>,
    pub grant_type: GrantType,
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Credential {
    /// Credential for the `client_credentials` grant
    pub fn client_credentials(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            auth_server_url: Some(url.into()),
            grant_type: GrantType::ClientCredentials,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            access_token: token,
            ..Self::default()
        }
    }

    /// Credential for the `refresh_token` grant
    pub fn refresh_token(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            auth_server_url: Some(url.into()),
            grant_type: GrantType::RefreshToken,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            refresh_token: Some(refresh_token.into()),
            access_token: token,
            ..Self::default()
        }
    }

    /// Credential for the resource-owner `password` grant
    pub fn password(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            auth_server_url: Some(url.into()),
            grant_type: GrantType::Password,
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            access_token: token,
            ..Self::default()
        }
    }

    /// Static bearer token without refresh capability
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { access_token: Some(token.into()), ..Self::default() }
    }

    /// Current access token, treating an empty string as absent
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }
}

fn redact(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("auth_server_url", &self.auth_server_url)
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factories_set_grant_type() {
        let cc = Credential::client_credentials("https://auth/token", "id", "secret", None);
        assert_eq!(cc.grant_type, GrantType::ClientCredentials);
        assert!(!cc.has_token());

        let rt = Credential::refresh_token("https://auth/token", "id", "secret", "r1", None);
        assert_eq!(rt.grant_type, GrantType::RefreshToken);
        assert_eq!(rt.refresh_token.as_deref(), Some("r1"));

        let bearer = Credential::bearer("abc");
        assert_eq!(bearer.grant_type, GrantType::None);
        assert_eq!(bearer.token(), Some("abc"));
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let credential = Credential::bearer("");
        assert!(!credential.has_token());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::password("u", "id", "top-secret", "bob", "hunter2", Some("tok".into()));
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tok\""));
        assert!(rendered.contains("bob"));
    }

    #[test]
    fn test_grant_type_wire_names() {
        assert_eq!("client_credentials".parse::<GrantType>().unwrap(), GrantType::ClientCredentials);
        assert_eq!(GrantType::RefreshToken.wire_name(), Some("refresh_token"));
        assert_eq!(GrantType::None.wire_name(), None);
        assert!("implicit".parse::<GrantType>().is_err());
    }
}
