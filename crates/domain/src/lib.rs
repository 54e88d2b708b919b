//! # Digirest Domain
//!
//! Value types shared by every Digirest crate.
//!
//! This crate contains:
//! - Error taxonomy and Result alias
//! - Credential and grant types
//! - Request/response descriptions and the debug snapshot
//! - Client configuration structures and allow-lists
//!
//! ## Architecture
//! - No dependencies on other Digirest crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
