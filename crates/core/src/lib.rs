//! # Digirest Core
//!
//! Request orchestration layer - no HTTP client code.
//!
//! This crate contains:
//! - The transport port and call observer (traits)
//! - Token acquisition for shared credentials
//! - Header merge, body encoding and URI assembly
//! - The dispatcher with its single retry after a 401
//!
//! ## Architecture Principles
//! - Only depends on `digirest-domain`
//! - All network access goes through [`ports::Transport`]

pub mod auth;
pub mod dispatch;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{SharedCredential, TokenManager};
pub use dispatch::{
    parse_method_name, ActionTarget, ClientSettings, DispatchContext, RequestDispatcher,
};
pub use ports::{
    CallObserver, EncodedBody, NoopObserver, OutputSink, Transport, TransportDiagnostics,
    TransportRequest, TransportResponse,
};
