//! Single-slot record of the most recent call

use digirest_core::ports::{CallObserver, TransportDiagnostics};
use digirest_domain::{ApiResponse, CallDetails, Verb};
use parking_lot::Mutex;

#[derive(Debug, Clone, Default)]
struct LastCall {
    request_uri: Option<String>,
    verb: Option<Verb>,
    response_code: Option<u16>,
    response: Option<ApiResponse>,
    diagnostics: Option<TransportDiagnostics>,
}

/// Keeps what the client reports through `last_request`, `verb`,
/// `response_code` and `details`. Every attempt overwrites the slot.
#[derive(Debug, Default)]
pub(crate) struct LastCallRecorder {
    state: Mutex<LastCall>,
}

impl LastCallRecorder {
    /// Forget the previous call before a new one starts
    pub(crate) fn reset(&self) {
        *self.state.lock() = LastCall::default();
    }

    pub(crate) fn record_response(&self, response: &ApiResponse) {
        self.state.lock().response = Some(response.clone());
    }

    pub(crate) fn request_uri(&self) -> Option<String> {
        self.state.lock().request_uri.clone()
    }

    pub(crate) fn verb(&self) -> Option<Verb> {
        self.state.lock().verb
    }

    pub(crate) fn response_code(&self) -> Option<u16> {
        self.state.lock().response_code
    }

    pub(crate) fn response(&self) -> Option<ApiResponse> {
        self.state.lock().response.clone()
    }

    pub(crate) fn diagnostics(&self) -> Option<TransportDiagnostics> {
        self.state.lock().diagnostics.clone()
    }

    pub(crate) fn details(&self) -> CallDetails {
        let state = self.state.lock();
        CallDetails::from_uri(
            state.request_uri.as_deref().unwrap_or_default(),
            state.verb,
            state.response_code,
        )
    }
}

impl CallObserver for LastCallRecorder {
    fn request_sent(&self, uri: &str, verb: Verb) {
        let mut state = self.state.lock();
        state.request_uri = Some(uri.to_string());
        state.verb = Some(verb);
        state.response_code = None;
        state.diagnostics = None;
    }

    fn response_received(&self, status: u16, diagnostics: &TransportDiagnostics) {
        let mut state = self.state.lock();
        state.response_code = Some(status);
        state.diagnostics = Some(diagnostics.clone());
    }
}
