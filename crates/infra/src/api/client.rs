//! API client facade
//!
//! Holds the client settings and credential, exposes the HTTP verbs and the
//! `<collection><Action>` dispatch, and remembers the last call for
//! introspection.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use digirest_core::dispatch::{normalize_base_url, parse_method_name, ActionTarget};
use digirest_core::ports::{OutputSink, Transport, TransportDiagnostics};
use digirest_core::{ClientSettings, DispatchContext, RequestDispatcher, SharedCredential};
use digirest_domain::constants::ACTION_PARAM;
use digirest_domain::{
    ApiResponse, AuthError, CallDetails, ClientConfig, ContentType, Credential, FormValue,
    OutputFormat, Pairs, RequestBody, RequestSpec, Result, Verb,
};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument, warn};

use super::last_call::LastCallRecorder;
use crate::http::ReqwestTransport;

/// REST API client.
///
/// Calls take `&self` and are serialized: one logical call (token check,
/// request, optional retry, recording) runs at a time per client, so the
/// last-call accessors always describe a complete call. Configuration
/// setters take `&mut self`.
pub struct ApiClient {
    dispatcher: RequestDispatcher,
    settings: ClientSettings,
    credential: Option<SharedCredential>,
    last_call: LastCallRecorder,
    call_lock: AsyncMutex<()>,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a client from loaded configuration, with the reqwest transport
    ///
    /// # Errors
    /// Returns `Config` for an empty base URL or when the transport cannot
    /// be built
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    fn new(
        transport: Arc<dyn Transport>,
        settings: ClientSettings,
        credential: Option<SharedCredential>,
    ) -> Self {
        Self {
            dispatcher: RequestDispatcher::new(transport),
            settings,
            credential,
            last_call: LastCallRecorder::default(),
            call_lock: AsyncMutex::new(()),
        }
    }

    /* ------------------------------------------------------------------ */
    /* Configuration */
    /* ------------------------------------------------------------------ */

    /// Set the base URL, normalized to end with exactly one `/`
    ///
    /// # Errors
    /// Returns `Config` for an empty URL; the previous URL is kept
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        self.settings.base_url = normalize_base_url(url)?;
        Ok(())
    }

    /// # Errors
    /// Returns `Config` when `format` is not an allowed response format
    pub fn set_format(&mut self, format: &str) -> Result<()> {
        self.settings.format = format.parse()?;
        Ok(())
    }

    /// # Errors
    /// Returns `Config` when `content_type` is not an allowed content type
    pub fn set_content_type(&mut self, content_type: &str) -> Result<()> {
        self.settings.content_type = content_type.parse()?;
        Ok(())
    }

    /// Bound each transport call; `None` waits indefinitely
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.settings.timeout = timeout;
    }

    pub fn set_immediate_output(&mut self, enabled: bool) {
        self.settings.immediate_output = enabled;
    }

    /// Replace the headers sent with every request
    pub fn set_default_headers<K, V, I>(&mut self, headers: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.settings.default_headers =
            headers.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    }

    /// Where response bytes go in immediate-output mode
    pub fn set_output_sink(&mut self, sink: OutputSink) {
        self.settings.output = sink;
    }

    /// Use a credential; pass a [`SharedCredential`] clone to share token
    /// state between clients
    pub fn set_credential(&mut self, credential: impl Into<SharedCredential>) {
        self.credential = Some(credential.into());
    }

    /// Credential for the `client_credentials` grant
    pub fn set_oauth_client_credentials(
        &mut self,
        auth_server_url: &str,
        client_id: &str,
        client_secret: &str,
        token: Option<String>,
    ) {
        self.set_credential(Credential::client_credentials(
            auth_server_url,
            client_id,
            client_secret,
            token,
        ));
    }

    /// Credential for the `refresh_token` grant
    pub fn set_refresh_token(
        &mut self,
        auth_server_url: &str,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
        token: Option<String>,
    ) {
        self.set_credential(Credential::refresh_token(
            auth_server_url,
            client_id,
            client_secret,
            refresh_token,
            token,
        ));
    }

    /// Credential for the resource-owner `password` grant
    pub fn set_password_credentials(
        &mut self,
        auth_server_url: &str,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
        token: Option<String>,
    ) {
        self.set_credential(Credential::password(
            auth_server_url,
            client_id,
            client_secret,
            username,
            password,
            token,
        ));
    }

    /// Static bearer token, never refreshed
    pub fn set_oauth_token(&mut self, token: &str) {
        self.set_credential(Credential::bearer(token));
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    pub fn format(&self) -> &OutputFormat {
        &self.settings.format
    }

    pub fn content_type(&self) -> ContentType {
        self.settings.content_type
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.settings.timeout
    }

    pub fn immediate_output(&self) -> bool {
        self.settings.immediate_output
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.settings.default_headers
    }

    pub fn credential(&self) -> Option<&SharedCredential> {
        self.credential.as_ref()
    }

    /* ------------------------------------------------------------------ */
    /* Token */
    /* ------------------------------------------------------------------ */

    /// Make sure the credential holds a token, fetching one when needed or
    /// when `force` is set.
    ///
    /// # Errors
    /// - `Auth(MissingCredential)` when no credential is set
    /// - `Config` / `Auth(TokenFetch)` from the token manager
    pub async fn get_token(&self, force: bool) -> Result<Credential> {
        let credential = self.credential.as_ref().ok_or(AuthError::MissingCredential)?;
        self.dispatcher.token_manager(self.settings.timeout).ensure_token(credential, force).await
    }

    /* ------------------------------------------------------------------ */
    /* Verbs */
    /* ------------------------------------------------------------------ */

    /// GET `resource` with `query` appended to the URL
    ///
    /// # Errors
    /// See [`ApiClient::execute`]
    pub async fn get<K, V, I>(&self, resource: &str, query: I) -> Result<ApiResponse>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.execute(RequestSpec::get(resource).query_pairs(query)).await
    }

    /// POST `body` to `resource`
    ///
    /// # Errors
    /// See [`ApiClient::execute`]
    pub async fn post(&self, resource: &str, body: RequestBody) -> Result<ApiResponse> {
        self.execute(RequestSpec::post(resource).body(body)).await
    }

    /// PUT `body` to `resource`
    ///
    /// # Errors
    /// See [`ApiClient::execute`]
    pub async fn put(&self, resource: &str, body: RequestBody) -> Result<ApiResponse> {
        self.execute(RequestSpec::put(resource).body(body)).await
    }

    /// DELETE `resource`; `query` decorates the URL
    ///
    /// # Errors
    /// See [`ApiClient::execute`]
    pub async fn delete<K, V, I>(&self, resource: &str, query: I) -> Result<ApiResponse>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.execute(RequestSpec::delete(resource).query_pairs(query)).await
    }

    /// POST `files` and `body` fields as multipart/form-data
    ///
    /// # Errors
    /// Returns `Config` when `body` is raw text or a JSON value that is not
    /// an object; otherwise see [`ApiClient::execute`]
    pub async fn post_file<K, I>(
        &self,
        resource: &str,
        files: I,
        body: RequestBody,
    ) -> Result<ApiResponse>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PathBuf)>,
    {
        self.execute(RequestSpec::post(resource).body(body).files(files)?).await
    }

    /// PUT `files` and `body` fields as multipart/form-data
    ///
    /// # Errors
    /// Same as [`ApiClient::post_file`]
    pub async fn put_file<K, I>(
        &self,
        resource: &str,
        files: I,
        body: RequestBody,
    ) -> Result<ApiResponse>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PathBuf)>,
    {
        self.execute(RequestSpec::put(resource).body(body).files(files)?).await
    }

    /// Run one call described by `spec`.
    ///
    /// Non-2xx statuses, including a 401 that survived the retry, come back
    /// as responses.
    ///
    /// # Errors
    /// - `Config` for a missing base URL or an unencodable body
    /// - `Auth(MissingCredential)` when no credential is set
    /// - `Transport` / `Timeout` from the network
    #[instrument(skip(self, spec), fields(verb = %spec.verb, resource = %spec.resource))]
    pub async fn execute(&self, spec: RequestSpec) -> Result<ApiResponse> {
        let _call = self.call_lock.lock().await;
        self.last_call.reset();

        let ctx = DispatchContext {
            settings: &self.settings,
            credential: self.credential.as_ref(),
            observer: &self.last_call,
        };
        match self.dispatcher.execute(ctx, &spec).await {
            Ok(response) => {
                self.last_call.record_response(&response);
                debug!(
                    status = response.status_code,
                    attempts = response.attempts,
                    "call finished"
                );
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, label = err.label(), "call failed");
                Err(err)
            }
        }
    }

    /* ------------------------------------------------------------------ */
    /* Dynamic dispatch */
    /* ------------------------------------------------------------------ */

    /// POST `action` on `collection`.
    ///
    /// `action` is added to the body unless `params` already has one; the
    /// query string carries whichever action the body ends up with. `files`
    /// switch the body to multipart.
    ///
    /// # Errors
    /// Returns `Config` when `params` is raw text or a JSON value that is not
    /// an object; otherwise see [`ApiClient::execute`]
    pub async fn call(
        &self,
        collection: &str,
        action: &str,
        params: RequestBody,
        files: Vec<(String, PathBuf)>,
        headers: Pairs,
    ) -> Result<ApiResponse> {
        let target = ActionTarget::new(collection, action);
        self.execute(action_spec(&target, params, files, headers)?).await
    }

    /// Call an action named `<collection><Action>`, e.g. `mailingsRead`.
    ///
    /// # Errors
    /// Returns `Config` when `name` does not follow the convention, before
    /// any network activity; otherwise see [`ApiClient::call`]
    pub async fn call_method(
        &self,
        name: &str,
        params: RequestBody,
        files: Vec<(String, PathBuf)>,
        headers: Pairs,
    ) -> Result<ApiResponse> {
        let target = parse_method_name(name)?;
        debug!(method = name, %target, "dispatching action");
        self.execute(action_spec(&target, params, files, headers)?).await
    }

    /* ------------------------------------------------------------------ */
    /* Last call */
    /* ------------------------------------------------------------------ */

    /// URI of the last attempt
    pub fn last_request(&self) -> Option<String> {
        self.last_call.request_uri()
    }

    pub fn verb(&self) -> Option<Verb> {
        self.last_call.verb()
    }

    pub fn response_code(&self) -> Option<u16> {
        self.last_call.response_code()
    }

    pub fn last_response(&self) -> Option<ApiResponse> {
        self.last_call.response()
    }

    pub fn last_diagnostics(&self) -> Option<TransportDiagnostics> {
        self.last_call.diagnostics()
    }

    /// Snapshot of the last call: status, URL parts and query parameters
    pub fn details(&self) -> CallDetails {
        self.last_call.details()
    }
}

fn action_spec(
    target: &ActionTarget,
    mut params: RequestBody,
    files: Vec<(String, PathBuf)>,
    headers: Pairs,
) -> Result<RequestSpec> {
    let action = match params.field(ACTION_PARAM) {
        Some(action) => action,
        None => {
            params.set_field(ACTION_PARAM, FormValue::Text(target.action.clone()))?;
            target.action.clone()
        }
    };

    let spec = RequestSpec::post(&target.collection)
        .query(ACTION_PARAM, action)
        .body(params)
        .headers(headers);
    if files.is_empty() {
        Ok(spec)
    } else {
        spec.files(files)
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: ClientConfig,
    credential: Option<SharedCredential>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    output: Option<OutputSink>,
}

impl ApiClientBuilder {
    /// Start from loaded configuration; later builder calls override it
    pub fn config(mut self, config: ClientConfig) -> Self {
        if let Some(credential) = config.credential.clone() {
            self.credential = Some(SharedCredential::new(credential));
        }
        self.config = config;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.config.content_type = content_type;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn immediate_output(mut self, enabled: bool) -> Self {
        self.config.immediate_output = enabled;
        self
    }

    /// Add a header sent with every request
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn credential(mut self, credential: impl Into<SharedCredential>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Use a custom transport instead of reqwest
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn output_sink(mut self, sink: OutputSink) -> Self {
        self.output = Some(sink);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    /// Returns `Config` when the base URL is set but empty, or when the
    /// default transport cannot be built
    pub fn build(self) -> Result<ApiClient> {
        let base_url = match self.config.base_url.as_deref() {
            Some(url) => normalize_base_url(url)?,
            None => String::new(),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let settings = ClientSettings {
            base_url,
            format: self.config.format,
            content_type: self.config.content_type,
            default_headers: self.config.default_headers,
            timeout: self.timeout.or(self.config.timeout_secs.map(Duration::from_secs)),
            immediate_output: self.config.immediate_output,
            output: self.output.unwrap_or_default(),
        };

        Ok(ApiClient::new(transport, settings, self.credential))
    }
}
