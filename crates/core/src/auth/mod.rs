//! OAuth credential lifecycle

pub mod shared;
pub mod token_manager;

pub use shared::SharedCredential;
pub use token_manager::TokenManager;
