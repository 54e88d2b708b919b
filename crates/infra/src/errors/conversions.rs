//! Conversions from external infrastructure errors into domain errors.

use std::io;
use std::time::Duration;

use digirest_domain::DigirestError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DigirestError);

impl From<InfraError> for DigirestError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DigirestError> for InfraError {
    fn from(value: DigirestError) -> Self {
        Self(value)
    }
}

impl InfraError {
    /// Map a reqwest failure, reporting timeouts with the configured bound
    pub fn from_http(err: HttpError, timeout: Option<Duration>) -> Self {
        if err.is_timeout() {
            return Self(DigirestError::Timeout(timeout.unwrap_or_default()));
        }
        Self::from(err)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDigirestError {
    fn into_digirest(self) -> DigirestError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DigirestError */
/* -------------------------------------------------------------------------- */

impl IntoDigirestError for HttpError {
    fn into_digirest(self) -> DigirestError {
        if self.is_timeout() {
            return DigirestError::Transport("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DigirestError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return DigirestError::Config(format!("invalid HTTP request: {self}"));
        }

        DigirestError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_digirest())
    }
}

/* -------------------------------------------------------------------------- */
/* io::Error → DigirestError */
/* -------------------------------------------------------------------------- */

impl IntoDigirestError for io::Error {
    fn into_digirest(self) -> DigirestError {
        DigirestError::Transport(format!("I/O failure: {self}"))
    }
}

impl From<io::Error> for InfraError {
    fn from(value: io::Error) -> Self {
        Self(value.into_digirest())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: DigirestError = InfraError::from(error).into();
        match mapped {
            DigirestError::Transport(msg) => assert!(msg.contains("connection")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_timeout_with_bound() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let bound = Duration::from_millis(50);
        let client = Client::builder().no_proxy().timeout(bound).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: DigirestError = InfraError::from_http(error, Some(bound)).into();
        assert!(matches!(mapped, DigirestError::Timeout(d) if d == bound));
    }

    #[test]
    fn io_error_maps_to_transport() {
        let err = io::Error::new(io::ErrorKind::NotFound, "missing.csv");
        let mapped: DigirestError = InfraError::from(err).into();
        assert!(matches!(mapped, DigirestError::Transport(msg) if msg.contains("missing.csv")));
    }
}
