//! REST API client facade
//!
//! # Architecture
//!
//! - Requests go through `digirest-core`'s `RequestDispatcher` (token check,
//!   single retry after a 401)
//! - The reqwest transport is the default; any `Transport` can be injected
//! - One logical call at a time per client; last-call state is kept for
//!   introspection

pub mod client;
mod last_call;

pub use client::{ApiClient, ApiClientBuilder};
