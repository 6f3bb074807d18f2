//! Common utilities and patterns shared across Codetriever crates
//!
//! This crate provides shared functionality to reduce duplication across
//! the various Codetriever components: error-handling traits and macros,
//! a portable error-kind taxonomy used at every crate boundary, correlation
//! IDs for cross-worker log correlation, and process-wide environment setup.

pub mod active_sources;
pub mod error;
pub mod error_sanitizer;
pub mod init;
pub mod kind;
pub mod tracing;

pub use active_sources::ActiveSources;
pub use error::{CommonError, ErrorContext};
pub use init::initialize_environment;
pub use kind::ErrorKind;
pub use tracing::CorrelationId;
