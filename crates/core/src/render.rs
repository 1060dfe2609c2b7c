//! Timeline rendering adapter.
//!
//! Turns a [`TimelineLayout`] plus the live task set into per-row, per-cell
//! view state. Widths are expressed in day units rather than pixels: the
//! consuming view distributes space proportionally, so a row is a sequence
//! of weights (leading spacer, one weight per stage, trailing spacer) that
//! together span the whole project. The engine's `pixels_per_day` is not
//! used here.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dates::{days_between, format_date_short};
use crate::layout::{TimelineLayout, TimelineRow};
use crate::models::{Stage, StageStatus, Task};
use crate::progress::{is_project_fully_completed, is_stage_effectively_completed, stage_progress};

/// Smallest cell weight, in days; keeps zero-length and inverted stages visible.
pub const MIN_CELL_DAYS: f64 = 0.001;

/// Pointer and selection state supplied by the view.
///
/// Selection and hover are tracked separately because the selection
/// survives the pointer moving across other cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// Stage opened in the side panel, if any.
    pub selected_stage_id: Option<String>,
    /// Stage currently under the pointer, if any.
    pub hovered_stage_id: Option<String>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, stage_id: impl Into<String>) {
        self.selected_stage_id = Some(stage_id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selected_stage_id = None;
    }

    /// Pointer entered a cell.
    pub fn pointer_enter(&mut self, stage_id: impl Into<String>) {
        self.hovered_stage_id = Some(stage_id.into());
    }

    /// Pointer left the cell it was over.
    pub fn pointer_leave(&mut self) {
        self.hovered_stage_id = None;
    }

    /// Stage whose dates the tooltip shows: hover wins over selection.
    pub fn tooltip_target(&self) -> Option<&str> {
        self.hovered_stage_id
            .as_deref()
            .or(self.selected_stage_id.as_deref())
    }

    fn is_selected(&self, stage_id: &str) -> bool {
        self.selected_stage_id.as_deref() == Some(stage_id)
    }

    fn is_hovered(&self, stage_id: &str) -> bool {
        self.hovered_stage_id.as_deref() == Some(stage_id)
    }
}

/// View state for one stage cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub stage_id: String,
    pub name: String,
    /// Flex weight of the cell, in days, never below [`MIN_CELL_DAYS`].
    pub duration_days: f64,
    /// Completion percentage of the stage.
    pub progress: f64,
    pub task_count: usize,
    pub completed_count: usize,
    pub is_selected: bool,
    pub is_hovered: bool,
    pub is_paused: bool,
    pub is_completed: bool,
    /// Completed by status or because every task is done.
    pub is_effectively_completed: bool,
    /// Completed stage in a project whose stages are all completed.
    pub show_project_completed: bool,
    /// Last cell in its row.
    pub is_last: bool,
}

/// View state for one timeline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    /// Empty days before the first stage.
    pub leading_spacer_days: f64,
    pub cells: Vec<CellView>,
    /// Empty days after the row's latest end.
    pub trailing_spacer_days: f64,
}

impl RowView {
    /// Sum of all weights in the row.
    pub fn total_weight(&self) -> f64 {
        self.leading_spacer_days
            + self.cells.iter().map(|c| c.duration_days).sum::<f64>()
            + self.trailing_spacer_days
    }
}

/// Date labels shown above a hovered or selected cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub stage_id: String,
    pub start_label: String,
    pub end_label: String,
}

/// Everything the view needs to draw a project timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    pub rows: Vec<RowView>,
    pub tooltip: Option<Tooltip>,
    pub project_fully_completed: bool,
}

/// Days between the project start and the row's first stage, floored at zero.
pub fn leading_spacer_days(stages: &[Stage], project_start: DateTime<Utc>) -> f64 {
    stages
        .first()
        .map_or(0.0, |first| days_between(project_start, first.start_date).max(0.0))
}

/// Days between the row's latest end and the project end, floored at zero.
pub fn trailing_spacer_days(stages: &[Stage], project_end: DateTime<Utc>) -> f64 {
    let row_end = stages
        .iter()
        .map(|stage| stage.end_date)
        .max()
        .unwrap_or(project_end);
    days_between(row_end, project_end).max(0.0)
}

/// Cell weight for a stage, floored at [`MIN_CELL_DAYS`].
pub fn cell_duration_days(stage: &Stage) -> f64 {
    days_between(stage.start_date, stage.end_date).max(MIN_CELL_DAYS)
}

/// Build a tooltip from optional dates; `None` when neither can be formatted.
pub fn build_tooltip(
    stage_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<Tooltip> {
    let start_label = format_date_short(start);
    let end_label = format_date_short(end);
    if start_label.is_empty() && end_label.is_empty() {
        return None;
    }
    Some(Tooltip {
        stage_id: stage_id.to_string(),
        start_label,
        end_label,
    })
}

/// Derive view state for one row of a layout.
pub fn render_row(
    row: &TimelineRow,
    layout: &TimelineLayout,
    tasks: &[Task],
    state: &InteractionState,
    project_fully_completed: bool,
) -> RowView {
    let last_index = row.stages.len().saturating_sub(1);
    let cells = row
        .stages
        .iter()
        .enumerate()
        .map(|(index, stage)| {
            let progress = stage_progress(stage, tasks);
            let is_completed = stage.status == StageStatus::Completed;
            CellView {
                stage_id: stage.id.clone(),
                name: stage.name.clone(),
                duration_days: cell_duration_days(stage),
                progress: progress.percentage,
                task_count: progress.total_count,
                completed_count: progress.completed_count,
                is_selected: state.is_selected(&stage.id),
                is_hovered: state.is_hovered(&stage.id),
                is_paused: stage.status == StageStatus::Paused,
                is_completed,
                is_effectively_completed: is_stage_effectively_completed(stage, tasks),
                show_project_completed: is_completed && project_fully_completed,
                is_last: index == last_index,
            }
        })
        .collect();

    RowView {
        leading_spacer_days: leading_spacer_days(&row.stages, layout.project_start_date),
        cells,
        trailing_spacer_days: trailing_spacer_days(&row.stages, layout.project_end_date),
    }
}

/// Derive view state for the whole layout.
pub fn render_timeline(
    layout: &TimelineLayout,
    tasks: &[Task],
    state: &InteractionState,
) -> TimelineView {
    let all_stages: Vec<Stage> = layout
        .rows
        .iter()
        .flat_map(|row| row.stages.iter().cloned())
        .collect();
    let project_fully_completed = is_project_fully_completed(&all_stages);

    let rows = layout
        .rows
        .iter()
        .map(|row| render_row(row, layout, tasks, state, project_fully_completed))
        .collect();

    let tooltip = state
        .tooltip_target()
        .and_then(|id| layout.find_stage(id))
        .and_then(|stage| build_tooltip(&stage.id, Some(stage.start_date), Some(stage.end_date)));

    TimelineView {
        rows,
        tooltip,
        project_fully_completed,
    }
}
