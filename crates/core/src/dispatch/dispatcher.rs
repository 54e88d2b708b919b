//! Single API call execution with the 401 retry policy

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use digirest_domain::constants::{HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE};
use digirest_domain::{
    ApiResponse, AuthError, ContentType, DigirestError, OutputFormat, Pairs, RequestSpec, Result,
};
use tracing::{debug, info, instrument, warn};

use super::body::encode_body;
use super::headers::{header_value, merge_headers};
use super::uri::build_uri;
use crate::auth::{SharedCredential, TokenManager};
use crate::ports::{
    CallObserver, EncodedBody, OutputSink, Transport, TransportRequest, TransportResponse,
};

/// Client-level settings applied to every call
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    /// Normalized base URL (one trailing slash); empty when unset
    pub base_url: String,
    pub format: OutputFormat,
    pub content_type: ContentType,
    pub default_headers: Pairs,
    pub timeout: Option<Duration>,
    pub immediate_output: bool,
    pub output: OutputSink,
}

/// Everything a dispatch needs from the calling client
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    pub settings: &'a ClientSettings,
    pub credential: Option<&'a SharedCredential>,
    pub observer: &'a dyn CallObserver,
}

/// Builds and sends API calls, retrying once after a 401 with a fresh token
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
}

/// Request parts that stay the same across attempts
struct PreparedCall {
    uri: String,
    headers: Pairs,
    body: EncodedBody,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Token manager bound to this dispatcher's transport
    pub fn token_manager(&self, timeout: Option<Duration>) -> TokenManager {
        TokenManager::new(Arc::clone(&self.transport)).with_timeout(timeout)
    }

    /// Execute one logical call.
    ///
    /// A 401 answer triggers exactly one forced token refresh and one retry.
    /// A second 401 is returned as a normal response.
    ///
    /// # Errors
    /// - `Config` for a missing base URL or a body that cannot be encoded
    /// - `Auth(MissingCredential)` when no credential is set
    /// - `Transport`/`Timeout` from the transport, unchanged
    #[instrument(skip_all, fields(verb = %spec.verb, resource = %spec.resource))]
    pub async fn execute(
        &self,
        ctx: DispatchContext<'_>,
        spec: &RequestSpec,
    ) -> Result<ApiResponse> {
        let settings = ctx.settings;
        if settings.base_url.is_empty() {
            return Err(DigirestError::config("Please set the base url to access the API."));
        }
        let credential = ctx.credential.ok_or(AuthError::MissingCredential)?;

        let prepared = prepare(settings, spec)?;
        let tokens = self.token_manager(settings.timeout);

        let token = current_token(&tokens, credential, false).await?;
        let first = self.send(ctx, spec, &prepared, token.as_deref()).await?;
        if first.status != 401 {
            return Ok(into_response(settings, spec, prepared.uri, first, 1));
        }

        info!(uri = %prepared.uri, "received 401, refreshing access token and retrying once");
        let token = current_token(&tokens, credential, true).await?;
        let second = self.send(ctx, spec, &prepared, token.as_deref()).await?;
        if second.status == 401 {
            warn!(uri = %prepared.uri, "access token still rejected after refresh");
        }
        Ok(into_response(settings, spec, prepared.uri, second, 2))
    }

    async fn send(
        &self,
        ctx: DispatchContext<'_>,
        spec: &RequestSpec,
        prepared: &PreparedCall,
        token: Option<&str>,
    ) -> Result<TransportResponse> {
        let auth: Pairs = token
            .map(|token| vec![(HEADER_AUTHORIZATION.to_string(), format!("Bearer {token}"))])
            .unwrap_or_default();
        let headers = merge_headers(&[&auth, &prepared.headers]);

        let request = TransportRequest {
            url: prepared.uri.clone(),
            verb: spec.verb,
            headers,
            body: prepared.body.clone(),
            timeout: ctx.settings.timeout,
            output: ctx.settings.immediate_output.then(|| ctx.settings.output.clone()),
        };

        ctx.observer.request_sent(&prepared.uri, spec.verb);
        debug!(uri = %prepared.uri, verb = %spec.verb, "sending request");

        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(uri = %prepared.uri, error = %err, label = err.label(), "request failed");
            err
        })?;

        ctx.observer.response_received(response.status, &response.diagnostics);
        let elapsed_ms = u64::try_from(response.diagnostics.elapsed.as_millis()).unwrap_or(u64::MAX);
        debug!(status = response.status, elapsed_ms, "response received");
        Ok(response)
    }
}

/// Headers, body and URI, computed before any network activity
fn prepare(settings: &ClientSettings, spec: &RequestSpec) -> Result<PreparedCall> {
    let base: Pairs = vec![
        (HEADER_CONTENT_TYPE.to_string(), settings.content_type.as_str().to_string()),
        (HEADER_ACCEPT.to_string(), settings.format.as_str().to_string()),
    ];
    let forced: Pairs = spec
        .content_type
        .map(|ct| vec![(HEADER_CONTENT_TYPE.to_string(), ct.as_str().to_string())])
        .unwrap_or_default();
    let headers = merge_headers(&[&base, &settings.default_headers, &spec.extra_headers, &forced]);

    let body = if spec.verb.has_body() {
        encode_body(effective_content_type(&headers, settings.content_type)?, &spec.body)?
    } else {
        EncodedBody::Empty
    };

    let uri = build_uri(&settings.base_url, &spec.resource, &spec.query);
    Ok(PreparedCall { uri, headers, body })
}

/// Content type named by the merged `Content-Type` header, parameters ignored
fn effective_content_type(
    headers: &[(String, String)],
    fallback: ContentType,
) -> Result<ContentType> {
    match header_value(headers, HEADER_CONTENT_TYPE) {
        Some(value) => {
            let media = value.split(';').next().unwrap_or_default().trim();
            ContentType::from_str(media)
        }
        None => Ok(fallback),
    }
}

/// Run `ensure_token`, degrading to the stored token when the fetch fails
async fn current_token(
    tokens: &TokenManager,
    credential: &SharedCredential,
    force: bool,
) -> Result<Option<String>> {
    match tokens.ensure_token(credential, force).await {
        Ok(current) => Ok(current.token().map(str::to_string)),
        Err(DigirestError::Auth(AuthError::TokenFetch(reason))) => {
            warn!(%reason, force, "continuing without a fresh access token");
            Ok(credential.access_token().await)
        }
        Err(err) => Err(err),
    }
}

fn into_response(
    settings: &ClientSettings,
    spec: &RequestSpec,
    uri: String,
    response: TransportResponse,
    attempts: u8,
) -> ApiResponse {
    let mut api_response = ApiResponse::from_parts(
        response.status,
        response.body,
        response.content_type,
        &settings.format,
        settings.immediate_output,
        uri,
        spec.verb,
    );
    api_response.attempts = attempts;
    api_response
}
