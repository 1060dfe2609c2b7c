//! Progress command for per-stage completion
//!
//! Implements the `stl progress` command, which joins the project's tasks
//! to its stages and reports completed/total counts and percentages.

use clap::Args;
use serde::Serialize;
use stageline_core::{
    Stage, StageStatus, Task, is_project_fully_completed,
    is_stage_effectively_completed, stage_progress,
};

use super::Inputs;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_progress_table};

/// Show completion progress for each stage
#[derive(Debug, Args)]
pub struct ProgressCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Progress of one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageProgressRow {
    pub stage_id: String,
    pub name: String,
    pub status: StageStatus,
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: f64,
    pub effectively_completed: bool,
}

impl StageProgressRow {
    pub fn from_stage(stage: &Stage, tasks: &[Task]) -> Self {
        let progress = stage_progress(stage, tasks);
        Self {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            status: stage.status,
            completed_count: progress.completed_count,
            total_count: progress.total_count,
            percentage: progress.percentage,
            effectively_completed: is_stage_effectively_completed(stage, tasks),
        }
    }
}

/// Result of the progress command
#[derive(Debug, Serialize)]
pub struct ProgressReport {
    pub project_id: String,
    pub project_name: String,
    pub stages: Vec<StageProgressRow>,
    /// Tasks that matched no stage
    pub unassigned_tasks: usize,
    pub project_fully_completed: bool,
}

impl ProgressReport {
    pub fn new(project_id: String, project_name: String, stages: &[Stage], tasks: &[Task]) -> Self {
        let unassigned_tasks = tasks
            .iter()
            .filter(|task| !stages.iter().any(|stage| task.belongs_to(stage)))
            .count();
        Self {
            project_id,
            project_name,
            stages: stages
                .iter()
                .map(|stage| StageProgressRow::from_stage(stage, tasks))
                .collect(),
            unassigned_tasks,
            project_fully_completed: is_project_fully_completed(stages),
        }
    }
}

impl std::fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Project: {}", self.project_name)?;
        write!(f, "{}", format_progress_table(&self.stages))?;
        if self.unassigned_tasks > 0 {
            write!(f, "\n{} tasks not assigned to any stage", self.unassigned_tasks)?;
        }
        if self.project_fully_completed {
            write!(f, "\nAll stages completed.")?;
        }
        Ok(())
    }
}

impl ProgressCommand {
    /// Execute the progress command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the snapshot cannot be loaded or the card dump
    /// cannot be synced.
    pub async fn execute(&self, inputs: &Inputs) -> CliResult<ProgressReport> {
        let snapshot = inputs.load_snapshot()?;
        let tasks = inputs.load_tasks(&snapshot).await?;

        Ok(ProgressReport::new(
            snapshot.project.id,
            snapshot.project.name,
            &snapshot.stages,
            &tasks,
        ))
    }
}
