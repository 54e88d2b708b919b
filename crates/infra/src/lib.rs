//! # Digirest Infrastructure
//!
//! Infrastructure implementations of the core ports, plus the client facade.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - The `ApiClient` facade
//! - Configuration loading (environment, JSON, TOML)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `digirest-core`
//! - Contains all "impure" code (network, file system, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder};
pub use digirest_core::{OutputSink, SharedCredential, Transport};
pub use digirest_domain::{
    ApiResponse, AuthError, CallDetails, ClientConfig, ContentType, Credential, DigirestError,
    FormValue, GrantType, OutputFormat, RequestBody, RequestSpec, ResponseBody, Result, Verb,
};
pub use errors::InfraError;
pub use http::ReqwestTransport;
