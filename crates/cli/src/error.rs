use std::path::PathBuf;
use thiserror::Error;

use stageline_core::CoreError;

/// Error types for the Stageline CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Error reading or writing an input or output file
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error decoding or encoding a JSON file
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Error encoding a report for output
    #[error("Failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),

    /// A command needed a card dump but none was configured
    #[error("No card dump given; pass --cards or set STL_CARDS")]
    MissingCards,

    /// Error raised by the core engine
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CliError {
    /// Message including every source in the chain, for the top-level report.
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = err.source();
        }
        message
    }
}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;
