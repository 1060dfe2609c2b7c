//! Stageline CLI Library
//!
//! This library exposes the CLI commands for use in integration tests.
//! The binary is in `main.rs` and uses this library.

pub mod commands;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod snapshot;

pub use commands::*;
pub use error::{CliError, CliResult};
