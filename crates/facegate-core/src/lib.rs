//! Core domain types for the facegate access controller.
//!
//! This crate holds the vocabulary shared by every other crate in the
//! workspace: identities, secret codes, face embeddings and match results,
//! together with the default tuning constants and the core error type.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
