//! Stage progress derived from the live task set.
//!
//! Progress is the share of a stage's tasks that are completed, expressed as
//! a percentage with two decimals. A stage with no tasks is at 0, and a stage
//! whose tasks are all done is at exactly 100.

use crate::models::{Stage, StageStatus, Task};

/// Progress information for a single stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageProgress {
    /// Number of matching tasks that are completed.
    pub completed_count: usize,
    /// Number of matching tasks.
    pub total_count: usize,
    /// Completion percentage (0-100, two decimals).
    pub percentage: f64,
}

impl StageProgress {
    /// Create a new StageProgress with computed percentage.
    pub fn new(completed_count: usize, total_count: usize) -> Self {
        let percentage = if total_count == 0 {
            0.0
        } else if completed_count >= total_count {
            100.0
        } else {
            let raw = completed_count as f64 / total_count as f64 * 100.0;
            (raw * 100.0).round() / 100.0
        };
        Self {
            completed_count,
            total_count,
            percentage,
        }
    }

    /// Check if every matching task is completed (and there is at least one).
    pub fn is_complete(&self) -> bool {
        self.total_count > 0 && self.completed_count == self.total_count
    }
}

/// Tasks that count toward `stage`, in input order.
pub fn stage_tasks<'a>(stage: &Stage, tasks: &'a [Task]) -> Vec<&'a Task> {
    tasks.iter().filter(|task| task.belongs_to(stage)).collect()
}

/// Completed and total counts for `stage`.
pub fn stage_progress(stage: &Stage, tasks: &[Task]) -> StageProgress {
    let (completed, total) = tasks
        .iter()
        .filter(|task| task.belongs_to(stage))
        .fold((0usize, 0usize), |(done, all), task| {
            (done + usize::from(task.is_completed), all + 1)
        });
    StageProgress::new(completed, total)
}

/// Completion percentage of `stage` in `[0, 100]`.
pub fn calculate_stage_progress(stage: &Stage, tasks: &[Task]) -> f64 {
    stage_progress(stage, tasks).percentage
}

/// A stage is effectively completed when its status says so, or when it has
/// tasks and every one of them is done.
pub fn is_stage_effectively_completed(stage: &Stage, tasks: &[Task]) -> bool {
    stage.status == StageStatus::Completed || stage_progress(stage, tasks).is_complete()
}

/// A project is fully completed when it has stages and all of them carry the
/// completed status.
pub fn is_project_fully_completed(stages: &[Stage]) -> bool {
    !stages.is_empty() && stages.iter().all(|s| s.status == StageStatus::Completed)
}
