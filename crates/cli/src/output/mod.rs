//! Output formatting module for Stageline
//!
//! Provides table formatting, text timeline bars and JSON rendering for CLI
//! output.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use stageline_core::{CellView, RowView};

use crate::commands::progress::StageProgressRow;
use crate::error::{CliError, CliResult};

/// Maximum width for the stage name column before truncation
const MAX_NAME_WIDTH: usize = 30;

/// How a command prints its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Render a report in the requested format.
///
/// # Errors
///
/// Returns `CliError::Encode` if the report cannot be serialized.
pub fn render<T: Serialize + fmt::Display>(report: &T, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(report).map_err(CliError::Encode),
    }
}

/// Truncate a string to `max_width` characters, adding ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let head: String = s.chars().take(max_width - 3).collect();
        format!("{}...", head)
    }
}

/// Format a percentage without trailing zeros (`70%`, `33.33%`).
pub fn format_percentage(percentage: f64) -> String {
    format!("{}%", percentage)
}

/// Format stage progress into an aligned table string.
///
/// Produces output in the format:
/// ```text
/// ID  Stage   Status  Tasks  Progress
/// --  ------  ------  -----  --------
/// s1  Design  active  7/10   70%
/// ```
pub fn format_progress_table(rows: &[StageProgressRow]) -> String {
    if rows.is_empty() {
        return "No stages found.".to_string();
    }

    let headers = ["ID", "Stage", "Status", "Tasks", "Progress"];

    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.stage_id.clone(),
                truncate(&row.name, MAX_NAME_WIDTH),
                row.status.as_str().to_string(),
                format!("{}/{}", row.completed_count, row.total_count),
                format_percentage(row.percentage),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, &headers.map(str::to_string), &widths);
    push_line(&mut output, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &cells {
        push_line(&mut output, row, &widths);
    }

    // Remove trailing newline
    output.pop();
    output
}

fn push_line(output: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    output.push_str(line.trim_end());
    output.push('\n');
}

/// Draw one timeline row as a text bar `columns` characters wide.
///
/// Spacers and cells share the width in proportion to their day weights;
/// every cell gets at least one character.
pub fn format_row_bar(row: &RowView, columns: usize) -> String {
    let total = row.total_weight();
    if total <= 0.0 || columns == 0 {
        return String::new();
    }
    let scale = columns as f64 / total;

    let mut bar = " ".repeat((row.leading_spacer_days * scale).round() as usize);
    for cell in &row.cells {
        let width = ((cell.duration_days * scale).round() as usize).max(1);
        bar.push_str(&cell_block(cell, width));
    }
    bar
}

fn cell_block(cell: &CellView, width: usize) -> String {
    let fill = if cell.is_effectively_completed {
        "#"
    } else if cell.is_paused {
        "~"
    } else {
        "="
    };
    if width < 3 {
        return fill.repeat(width);
    }

    let inner = width - 2;
    let label = truncate(&cell.name, inner);
    let pad = inner - label.chars().count();
    format!("[{}{}]", label, fill.repeat(pad))
}
