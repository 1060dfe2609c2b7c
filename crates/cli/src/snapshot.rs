//! Project snapshot files
//!
//! A snapshot is a JSON document holding one project, its stages and,
//! optionally, the task set from a previous sync:
//!
//! ```json
//! {
//!   "project": { "id": "p1", "name": "Launch", "kaiten_board_id": 42 },
//!   "stages": [
//!     { "id": "s1", "name": "Design", "start_date": "2024-01-01",
//!       "end_date": "2024-01-10", "kaiten_group_id": 100 }
//!   ],
//!   "tasks": []
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use stageline_core::{Project, Stage, Task};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// Default snapshot file name, looked up in the working directory
pub const DEFAULT_SNAPSHOT_PATH: &str = "stageline.json";

/// A project with its stages and last known tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProjectSnapshot {
    /// Run project and stage validation, logging failures.
    ///
    /// Returns the number of entities that failed. Invalid entities are still
    /// laid out; the engine treats their dates as given.
    pub fn check(&self) -> usize {
        let mut failures = 0;
        if let Err(e) = self.project.validate() {
            warn!("Project '{}' is invalid: {}", self.project.id, e);
            failures += 1;
        }
        for stage in &self.stages {
            if let Err(e) = stage.validate() {
                warn!("Stage '{}' is invalid: {}", stage.id, e);
                failures += 1;
            }
        }
        failures
    }
}

/// Read and decode a snapshot file.
///
/// # Errors
///
/// Returns `CliError::Io` if the file cannot be read and `CliError::Json` if
/// it is not a valid snapshot.
pub fn load_snapshot(path: &Path) -> CliResult<ProjectSnapshot> {
    let body = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: ProjectSnapshot =
        serde_json::from_str(&body).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "Loaded project '{}' with {} stages and {} tasks from {}",
        snapshot.project.id,
        snapshot.stages.len(),
        snapshot.tasks.len(),
        path.display()
    );
    snapshot.check();
    Ok(snapshot)
}

/// Write a JSON value to `path`, pretty-printed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let body = serde_json::to_string_pretty(value).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, body).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
