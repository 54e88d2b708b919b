//! Shared fixtures for the client integration tests.

use std::sync::Arc;

use digirest_infra::{ApiClient, Credential, ReqwestTransport, Transport};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/oauth/token";

/// Transport that ignores proxy settings, so requests reach the mock server.
pub fn transport() -> Arc<dyn Transport> {
    Arc::new(ReqwestTransport::builder().no_proxy().build().expect("transport should build"))
}

/// Client for `server` using the given credential.
pub fn client(server: &MockServer, credential: Credential) -> ApiClient {
    ApiClient::builder()
        .base_url(format!("{}/rest", server.uri()))
        .transport(transport())
        .credential(credential)
        .build()
        .expect("client should build")
}

/// `client_credentials` credential pointing at the mock token endpoint.
pub fn oauth_credential(server: &MockServer, token: Option<&str>) -> Credential {
    Credential::client_credentials(
        format!("{}{TOKEN_PATH}", server.uri()),
        "client-id",
        "client-secret",
        token.map(str::to_string),
    )
}

/// Token endpoint issuing `access_token`, expected to be hit `times` times.
pub async fn mount_token_endpoint(server: &MockServer, access_token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(times)
        .mount(server)
        .await;
}
