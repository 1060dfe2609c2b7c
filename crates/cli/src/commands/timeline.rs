//! Timeline command for drawing the project timeline
//!
//! Implements the `stl timeline` command: lays out the stages, derives cell
//! view state with progress, and draws each row as a proportional text bar.

use clap::Args;
use serde::Serialize;
use stageline_core::{
    InteractionState, TimelineView, calculate_timeline_layout, format_date_display, render_timeline,
};

use super::Inputs;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_percentage, format_row_bar};

/// Default width of the text timeline, in characters
const DEFAULT_COLUMNS: usize = 80;

/// Draw the project timeline with per-stage progress
#[derive(Debug, Args)]
pub struct TimelineCommand {
    /// Put every stage on a single row in start order
    #[arg(long)]
    pub sequential: bool,

    /// Stage to mark as selected
    #[arg(long)]
    pub select: Option<String>,

    /// Stage to mark as hovered (its dates are shown)
    #[arg(long)]
    pub hover: Option<String>,

    /// Width of the drawn timeline in characters
    #[arg(long, default_value_t = DEFAULT_COLUMNS)]
    pub columns: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of the timeline command
#[derive(Debug, Serialize)]
pub struct TimelineReport {
    pub project_name: String,
    pub start_label: String,
    pub end_label: String,
    #[serde(skip)]
    pub columns: usize,
    #[serde(flatten)]
    pub view: TimelineView,
}

impl std::fmt::Display for TimelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}  {} - {}",
            self.project_name, self.start_label, self.end_label
        )?;
        if self.view.rows.is_empty() {
            return write!(f, "\nNo stages.");
        }

        for row in &self.view.rows {
            write!(f, "\n|{}", format_row_bar(row, self.columns))?;
        }

        writeln!(f)?;
        for cell in self.view.rows.iter().flat_map(|row| row.cells.iter()) {
            let mut flags = Vec::new();
            if cell.is_paused {
                flags.push("paused");
            }
            if cell.is_completed {
                flags.push("completed");
            } else if cell.is_effectively_completed {
                flags.push("all tasks done");
            }
            if cell.show_project_completed {
                flags.push("project completed");
            }
            if cell.is_selected {
                flags.push("selected");
            }

            write!(
                f,
                "\n{}  {}  {} ({}/{})",
                if cell.is_hovered { '>' } else { ' ' },
                cell.name,
                format_percentage(cell.progress),
                cell.completed_count,
                cell.task_count
            )?;
            if !flags.is_empty() {
                write!(f, "  [{}]", flags.join(", "))?;
            }
        }

        if let Some(tooltip) = &self.view.tooltip {
            write!(
                f,
                "\n\n{}: {} - {}",
                tooltip.stage_id, tooltip.start_label, tooltip.end_label
            )?;
        }
        Ok(())
    }
}

impl TimelineCommand {
    fn interaction(&self) -> InteractionState {
        let mut state = InteractionState::new();
        if let Some(id) = &self.select {
            state.select(id.as_str());
        }
        if let Some(id) = &self.hover {
            state.pointer_enter(id.as_str());
        }
        state
    }

    /// Execute the timeline command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the snapshot cannot be loaded or the card dump
    /// cannot be synced.
    pub async fn execute(&self, inputs: &Inputs) -> CliResult<TimelineReport> {
        let snapshot = inputs.load_snapshot()?;
        let tasks = inputs.load_tasks(&snapshot).await?;

        let options = inputs.layout_options(&snapshot, self.sequential);
        let layout = calculate_timeline_layout(&snapshot.stages, &options);
        let view = render_timeline(&layout, &tasks, &self.interaction());

        Ok(TimelineReport {
            project_name: snapshot.project.name,
            start_label: format_date_display(Some(layout.project_start_date)),
            end_label: format_date_display(Some(layout.project_end_date)),
            columns: self.columns,
            view,
        })
    }
}
