//! Scripted transport for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use digirest_domain::{DigirestError, Result};
use parking_lot::Mutex;

use crate::ports::{Transport, TransportDiagnostics, TransportRequest, TransportResponse};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str, content_type: Option<&str>) -> Self {
        self.responses.lock().push_back(Ok(TransportResponse {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
            content_type: content_type.map(str::to_string),
            diagnostics: TransportDiagnostics::default(),
        }));
        self
    }

    pub fn respond_json(self, status: u16, body: &str) -> Self {
        self.respond(status, body, Some("application/json"))
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses.lock().push_back(Err(DigirestError::Transport(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(DigirestError::Transport("no scripted response left".into())))
    }
}
