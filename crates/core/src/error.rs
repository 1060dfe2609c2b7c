use thiserror::Error;

/// Error types for Stageline core operations.
///
/// Only the sync boundary and the lifecycle/validation helpers produce these;
/// layout, progress and rendering never fail.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The project has no external board reference, so there is nothing to fetch
    #[error("Project '{project_id}' has no Kaiten board reference")]
    MissingBoardRef { project_id: String },

    /// The project's board reference is not a numeric board id
    #[error("Invalid Kaiten board reference '{value}' on project '{project_id}'")]
    InvalidBoardRef { project_id: String, value: String },

    /// The injected fetcher failed to load cards for a board
    #[error("Failed to fetch cards for board {board_id}: {message}")]
    Fetch { board_id: u64, message: String },

    /// A board response could not be decoded as JSON
    #[error("Malformed board response: {0}")]
    Payload(#[from] serde_json::Error),

    /// Date text at the boundary could not be parsed
    #[error("Invalid date '{input}': expected YYYY-MM-DD or RFC 3339")]
    InvalidDate { input: String },

    /// A stage or project lifecycle rule was violated
    #[error("Cannot move {entity} '{id}' from '{from}' to '{to}'")]
    InvalidStatusTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Error for invalid input or validation failure
    #[error("{message}")]
    Validation { message: String },
}

impl CoreError {
    /// Build a validation error from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
