//! RDA client library
//!
//! A Rust client for the NCAR Research Data Archive REST API. Provides
//! dataset lookups, subset request submission and sequential, resumable
//! download of request files with proper error handling.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
