use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use digirest_core::ports::{
    EncodedBody, OutputSink, Transport, TransportDiagnostics, TransportRequest, TransportResponse,
};
use digirest_domain::constants::{CONNECT_TIMEOUT_SECS, HEADER_CONTENT_TYPE};
use digirest_domain::{DigirestError, FormValue, Result, Verb};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method, Response};
use tracing::{debug, instrument};

use crate::errors::InfraError;

/// [`Transport`] implementation on top of reqwest.
///
/// Speaks HTTP/1.1 and keeps no idle connections, so each call owns its
/// connection until the response has been captured.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `Config` when the TLS backend cannot be initialized
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    fn method(verb: Verb) -> Method {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(verb = %request.verb, url = %request.url))]
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let started = Instant::now();
        let TransportRequest { url, verb, headers, body, timeout, output } = request;
        let multipart = body.is_multipart();

        let mut builder = self.client.request(Self::method(verb), &url);
        for (name, value) in &headers {
            // reqwest sets the multipart boundary itself
            if multipart && name.eq_ignore_ascii_case(HEADER_CONTENT_TYPE) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            EncodedBody::Empty => builder,
            EncodedBody::Text(text) => builder.body(text),
            EncodedBody::Multipart(fields) => builder.multipart(multipart_form(fields).await?),
        };

        debug!(%verb, %url, "sending HTTP request");
        let response = builder.send().await.map_err(|err| http_error(err, timeout))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let final_url = response.url().to_string();
        debug!(%verb, %url, status, "received HTTP response");

        let (body, bytes_received) = match output {
            Some(sink) => (Bytes::new(), stream_into(response, &sink, timeout).await?),
            None => {
                let bytes = response.bytes().await.map_err(|err| http_error(err, timeout))?;
                let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
                (bytes, len)
            }
        };

        Ok(TransportResponse {
            status,
            body,
            content_type,
            diagnostics: TransportDiagnostics {
                elapsed: started.elapsed(),
                final_url,
                bytes_received,
            },
        })
    }
}

/// Forward the body chunk by chunk as it arrives
async fn stream_into(
    mut response: Response,
    sink: &OutputSink,
    timeout: Option<Duration>,
) -> Result<u64> {
    let mut total = 0_u64;
    while let Some(chunk) = response.chunk().await.map_err(|err| http_error(err, timeout))? {
        sink.write_chunk(&chunk).map_err(|err| DigirestError::from(InfraError::from(err)))?;
        total += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
    }
    sink.flush().map_err(|err| DigirestError::from(InfraError::from(err)))?;
    Ok(total)
}

async fn multipart_form(fields: Vec<(String, FormValue)>) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = match value {
            FormValue::Text(text) => form.text(name, text),
            FormValue::File(path) => form.part(name, file_part(&path).await?),
        };
    }
    Ok(form)
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|err| {
        DigirestError::Transport(format!("failed to read upload {}: {err}", path.display()))
    })?;
    let mut part = Part::bytes(bytes);
    if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
        part = part.file_name(file_name.to_string());
    }
    Ok(part)
}

fn http_error(err: reqwest::Error, timeout: Option<Duration>) -> DigirestError {
    InfraError::from_http(err, timeout).into()
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    user_agent: Option<String>,
    use_proxy: bool,
    accept_invalid_certs: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            user_agent: None,
            use_proxy: true,
            accept_invalid_certs: false,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Ignore `HTTP(S)_PROXY` settings from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// # Errors
    /// Returns `Config` when reqwest rejects the client configuration
    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder()
            .http1_only()
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(0);

        if !self.use_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|err| DigirestError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::builder().no_proxy().build().expect("transport")
    }

    fn request(verb: Verb, url: String) -> TransportRequest {
        TransportRequest {
            url,
            verb,
            headers: Vec::new(),
            body: EncodedBody::Empty,
            timeout: None,
            output: None,
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn sends_headers_and_captures_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(header("Authorization", "Bearer t"))
            .and(header("Accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/json")
                    .set_body_raw(r#"{"ok":true}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(Verb::Get, format!("{}/contacts", server.uri()));
        req.headers = vec![
            ("Authorization".into(), "Bearer t".into()),
            ("Accept".into(), "application/json".into()),
        ];
        let response = transport().execute(req).await.expect("response");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        assert_eq!(response.diagnostics.bytes_received, 11);
        assert!(response.diagnostics.final_url.ends_with("/contacts"));
    }

    #[tokio::test]
    async fn error_statuses_are_responses() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .expect(1)
            .mount(&server)
            .await;

        let response =
            transport().execute(request(Verb::Delete, server.uri())).await.expect("response");

        assert_eq!(response.status, 404);
        assert_eq!(response.body, "missing");
    }

    #[tokio::test]
    async fn binary_body_survives_buffering() {
        let payload: &[u8] = &[0x89, b'P', b'N', b'G', 0xFF, 0x00, 0xFE];
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/bin")
                    .set_body_bytes(payload.to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response =
            transport().execute(request(Verb::Get, server.uri())).await.expect("response");

        assert_eq!(response.body.as_ref(), payload);
        assert_eq!(response.diagnostics.bytes_received, 7);
    }

    #[tokio::test]
    async fn posts_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string("text=hi"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(Verb::Post, server.uri());
        req.headers = vec![("Content-Type".into(), "application/x-www-form-urlencoded".into())];
        req.body = EncodedBody::Text("text=hi".into());

        assert_eq!(transport().execute(req).await.expect("response").status, 201);
    }

    #[tokio::test]
    async fn uploads_files_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let file_path = dir.path().join("report.csv");
        std::fs::write(&file_path, "a,b\n1,2\n").expect("write fixture");

        let mut req = request(Verb::Put, server.uri());
        req.headers = vec![("Content-Type".into(), "multipart/form-data".into())];
        req.body = EncodedBody::Multipart(vec![
            ("name".into(), FormValue::Text("report".into())),
            ("file".into(), FormValue::File(file_path)),
        ]);
        transport().execute(req).await.expect("response");

        let received = server.received_requests().await.expect("recorded requests");
        let content_type = received[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .expect("content type")
            .to_string();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("filename=\"report.csv\""));
        assert!(body.contains("a,b\n1,2\n"));
        assert!(body.contains("name=\"name\""));
    }

    #[tokio::test]
    async fn missing_upload_file_is_transport_error() {
        let mut req = request(Verb::Post, "http://127.0.0.1:9/".into());
        req.body =
            EncodedBody::Multipart(vec![("file".into(), FormValue::File("/nonexistent/x".into()))]);

        let err = transport().execute(req).await.unwrap_err();
        assert!(matches!(err, DigirestError::Transport(msg) if msg.contains("/nonexistent/x")));
    }

    #[tokio::test]
    async fn immediate_output_streams_to_sink() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("streamed payload"))
            .mount(&server)
            .await;

        let buf = SharedBuf::default();
        let mut req = request(Verb::Get, server.uri());
        req.output = Some(OutputSink::new(buf.clone()));
        let response = transport().execute(req).await.expect("response");

        assert_eq!(response.body, "");
        assert_eq!(response.diagnostics.bytes_received, 16);
        assert_eq!(buf.0.lock().as_slice(), b"streamed payload");
    }

    #[tokio::test]
    async fn per_request_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let mut req = request(Verb::Get, server.uri());
        req.timeout = Some(Duration::from_millis(50));
        let err = transport().execute(req).await.unwrap_err();

        assert!(matches!(err, DigirestError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
