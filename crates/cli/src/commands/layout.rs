//! Layout command for packing stages into timeline rows
//!
//! Implements the `stl layout` command, which prints the rows, offsets and
//! scale computed by the layout engine.

use clap::Args;
use serde::Serialize;
use stageline_core::{TimelineLayout, calculate_timeline_layout, format_date_display};

use super::Inputs;
use crate::error::CliResult;
use crate::output::OutputFormat;

/// Pack the project's stages into non-overlapping rows
#[derive(Debug, Args)]
pub struct LayoutCommand {
    /// Put every stage on a single row in start order
    #[arg(long)]
    pub sequential: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of the layout command
#[derive(Debug, Serialize)]
pub struct LayoutReport {
    pub project_id: String,
    pub project_name: String,
    #[serde(flatten)]
    pub layout: TimelineLayout,
}

/// Round to two decimals for display.
fn two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl std::fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.layout.rows.is_empty() {
            return write!(f, "{}: no stages to lay out.", self.project_name);
        }

        write!(
            f,
            "{}: {} - {} ({} days, {} px/day)",
            self.project_name,
            format_date_display(Some(self.layout.project_start_date)),
            format_date_display(Some(self.layout.project_end_date)),
            two_decimals(self.layout.total_days()),
            two_decimals(self.layout.pixels_per_day)
        )?;

        for (index, row) in self.layout.rows.iter().enumerate() {
            write!(f, "\nRow {} (offset {} px)", index + 1, row.offset)?;
            for stage in &row.stages {
                write!(
                    f,
                    "\n  {}  {}  {} - {}  {}",
                    stage.id,
                    stage.name,
                    format_date_display(Some(stage.start_date)),
                    format_date_display(Some(stage.end_date)),
                    stage.status
                )?;
            }
        }
        Ok(())
    }
}

impl LayoutCommand {
    /// Execute the layout command.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the project snapshot cannot be loaded.
    pub fn execute(&self, inputs: &Inputs) -> CliResult<LayoutReport> {
        let snapshot = inputs.load_snapshot()?;
        let options = inputs.layout_options(&snapshot, self.sequential);
        let layout = calculate_timeline_layout(&snapshot.stages, &options);

        Ok(LayoutReport {
            project_id: snapshot.project.id,
            project_name: snapshot.project.name,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stageline_core::{LayoutOptions, Stage};

    fn report(stages: &[Stage]) -> LayoutReport {
        LayoutReport {
            project_id: "p1".to_string(),
            project_name: "Launch".to_string(),
            layout: calculate_timeline_layout(stages, &LayoutOptions::new()),
        }
    }

    fn day(d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_layout_report_display() {
        let stages = vec![
            Stage::new("A", "Design", day(1), day(10)),
            Stage::new("B", "Build", day(5), day(15)),
            Stage::new("C", "Launch", day(20), day(25)),
        ];
        let text = report(&stages).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Launch: 01.01.24 - 25.01.24 (24 days, 165 px/day)");
        assert_eq!(lines[1], "Row 1 (offset 0 px)");
        assert_eq!(lines[2], "  A  Design  01.01.24 - 10.01.24  active");
        assert_eq!(lines[3], "Row 2 (offset 660 px)");
        assert_eq!(lines[4], "  B  Build  05.01.24 - 15.01.24  active");
        assert_eq!(lines[5], "  C  Launch  20.01.24 - 25.01.24  active");
    }

    #[test]
    fn test_layout_report_empty() {
        assert_eq!(report(&[]).to_string(), "Launch: no stages to lay out.");
    }

    #[test]
    fn test_layout_report_json_flattens_layout() {
        let stages = vec![Stage::new("A", "Design", day(1), day(10))];
        let json = serde_json::to_value(report(&stages)).unwrap();
        assert_eq!(json["project_id"], "p1");
        assert_eq!(json["pixels_per_day"], 165.0);
        assert_eq!(json["rows"][0]["stages"][0]["id"], "A");
        assert_eq!(json["rows"][0]["offset"], 0);
    }
}
