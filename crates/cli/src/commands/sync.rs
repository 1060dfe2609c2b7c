//! Sync command for refreshing a project's tasks from its board
//!
//! Implements the `stl sync` command, which reads the board's cards from the
//! configured dump, tags them with stages and optionally writes the snapshot
//! back with the new task set.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use stageline_core::sync::board_id_for;
use stageline_core::{Task, sort_tasks_for_display};
use tracing::info;

use super::Inputs;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use crate::snapshot::{ProjectSnapshot, write_json};

/// Sync the project's tasks from its Kaiten board
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Write the snapshot with the synced tasks to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of the sync command
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub project_id: String,
    pub board_id: u64,
    /// Tasks tagged with a stage
    pub matched: usize,
    /// Tasks whose group matched no stage
    pub unmatched: usize,
    pub completed: usize,
    /// Snapshot file written, if any
    pub destination: Option<String>,
    /// Synced tasks, open first
    pub tasks: Vec<Task>,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Synced {} tasks for project {} from board {}",
            self.tasks.len(),
            self.project_id,
            self.board_id
        )?;
        writeln!(f, "  Matched to stages: {}", self.matched)?;
        writeln!(f, "  Unmatched: {}", self.unmatched)?;
        write!(f, "  Completed: {}", self.completed)?;
        if let Some(destination) = &self.destination {
            write!(f, "\n  Output: {}", destination)?;
        }
        Ok(())
    }
}

impl SyncCommand {
    /// Execute the sync command.
    ///
    /// The new task set replaces whatever the snapshot held.
    ///
    /// # Errors
    ///
    /// Returns `CliError::MissingCards` without a card dump, and propagates
    /// snapshot, board reference and fetch failures.
    pub async fn execute(&self, inputs: &Inputs) -> CliResult<SyncReport> {
        if inputs.cards.is_none() {
            return Err(CliError::MissingCards);
        }

        let snapshot = inputs.load_snapshot()?;
        let board_id = board_id_for(&snapshot.project)?;
        let tasks = inputs.load_tasks(&snapshot).await?;

        let matched = tasks.iter().filter(|t| t.stage_id.is_some()).count();
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        let tasks = sort_tasks_for_display(&tasks);

        let destination = match &self.output {
            Some(path) => {
                let updated = ProjectSnapshot {
                    tasks: tasks.clone(),
                    ..snapshot.clone()
                };
                write_json(path, &updated)?;
                info!("Wrote {} tasks to {}", tasks.len(), path.display());
                Some(path.display().to_string())
            }
            None => None,
        };

        Ok(SyncReport {
            project_id: snapshot.project.id,
            board_id,
            matched,
            unmatched: tasks.len() - matched,
            completed,
            destination,
            tasks,
        })
    }
}
