//! Timeline layout engine.
//!
//! Places date-ranged stages into horizontal rows so that no two stages in a
//! row overlap, and scales the whole span to the available viewport.
//!
//! Packing is greedy with a single-row lookback: stages are taken in start
//! order and appended to the most recent row unless they overlap one of its
//! members, in which case a new row is opened. Earlier rows are never
//! revisited, so a timeline reads top to bottom in roughly chronological
//! order even when that costs an extra row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::dates::days_between;
use crate::models::Stage;

/// Pixels per day when nothing constrains the scale.
pub const BASE_PIXELS_PER_DAY: f64 = 165.0;

/// Narrowest scale the engine will shrink to.
pub const MIN_PIXELS_PER_DAY: f64 = 50.0;

/// Share of the viewport the full project span should occupy.
const VIEWPORT_FILL: f64 = 0.9;

/// Inputs to [`calculate_timeline_layout`] besides the stages themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutOptions {
    /// Put every stage on one row in start order (preview mode).
    pub sequential: bool,
    /// Available width in pixels, if known.
    pub viewport_width: Option<f64>,
    /// Declared project start, overriding the stages' earliest start.
    pub project_start: Option<DateTime<Utc>>,
    /// Declared project end, overriding the stages' latest end.
    pub project_end: Option<DateTime<Utc>>,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = Some(width);
        self
    }

    /// Use declared project bounds; either side may be absent.
    pub fn with_project_bounds(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.project_start = start;
        self.project_end = end;
        self
    }
}

/// A horizontal lane of non-overlapping stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    /// Members ordered by start date.
    pub stages: Vec<Stage>,
    /// Pixel distance from the layout's start to the row's earliest stage.
    pub offset: i64,
}

impl TimelineRow {
    fn with_stage(stage: Stage) -> Self {
        Self {
            stages: vec![stage],
            offset: 0,
        }
    }

    fn overlaps_any(&self, stage: &Stage) -> bool {
        self.stages.iter().any(|existing| overlaps(stage, existing))
    }
}

/// Row-partitioned, scaled description of a project's timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLayout {
    /// Rows in discovery order.
    pub rows: Vec<TimelineRow>,
    pub project_start_date: DateTime<Utc>,
    pub project_end_date: DateTime<Utc>,
    /// Scale shared by all rows.
    pub pixels_per_day: f64,
}

impl TimelineLayout {
    /// Total number of stages across all rows.
    pub fn stage_count(&self) -> usize {
        self.rows.iter().map(|row| row.stages.len()).sum()
    }

    /// Look up a stage by id in any row.
    pub fn find_stage(&self, stage_id: &str) -> Option<&Stage> {
        self.rows
            .iter()
            .flat_map(|row| row.stages.iter())
            .find(|stage| stage.id == stage_id)
    }

    /// Project span in (fractional) days.
    pub fn total_days(&self) -> f64 {
        days_between(self.project_start_date, self.project_end_date)
    }
}

static_assertions::assert_impl_all!(TimelineLayout: Send, Sync);
static_assertions::assert_impl_all!(LayoutOptions: Send, Sync, Copy);

/// Closed-interval overlap: stages that merely touch at an endpoint overlap.
///
/// Uses raw dates, so an inverted stage (end before start) is compared as is.
pub fn overlaps(a: &Stage, b: &Stage) -> bool {
    a.start_date <= b.end_date && b.start_date <= a.end_date
}

/// Scale for a span of `total_days` in a viewport of `viewport_width` pixels.
///
/// Falls back to [`BASE_PIXELS_PER_DAY`] when the width is absent, not
/// finite or not positive, or when the span is empty.
pub fn pixels_per_day(total_days: f64, viewport_width: Option<f64>) -> f64 {
    match viewport_width {
        Some(width) if width.is_finite() && width > 0.0 && total_days > 0.0 => {
            (width * VIEWPORT_FILL / total_days).clamp(MIN_PIXELS_PER_DAY, BASE_PIXELS_PER_DAY)
        }
        _ => BASE_PIXELS_PER_DAY,
    }
}

/// Lay out `stages` into rows.
///
/// Never fails: malformed stages are placed using their raw dates.
pub fn calculate_timeline_layout(stages: &[Stage], options: &LayoutOptions) -> TimelineLayout {
    if stages.is_empty() {
        let now = Utc::now();
        return TimelineLayout {
            rows: Vec::new(),
            project_start_date: now,
            project_end_date: now,
            pixels_per_day: BASE_PIXELS_PER_DAY,
        };
    }

    let mut sorted = stages.to_vec();
    sorted.sort_by_key(|stage| stage.start_date);

    let calculated_start = sorted[0].start_date;
    let calculated_end = sorted
        .iter()
        .map(|stage| stage.end_date)
        .max()
        .unwrap_or(calculated_start);

    let project_start = options.project_start.unwrap_or(calculated_start);
    let project_end = options.project_end.unwrap_or(calculated_end);

    let scale = pixels_per_day(
        days_between(project_start, project_end),
        options.viewport_width,
    );

    if options.sequential {
        debug!("Sequential layout of {} stages", sorted.len());
        return TimelineLayout {
            rows: vec![TimelineRow {
                stages: sorted,
                offset: 0,
            }],
            project_start_date: project_start,
            project_end_date: project_end,
            pixels_per_day: scale,
        };
    }

    let mut rows = pack_rows(sorted);

    for row in &mut rows {
        let earliest = row
            .stages
            .iter()
            .map(|stage| stage.start_date)
            .min()
            .unwrap_or(project_start);
        row.offset = (days_between(project_start, earliest) * scale).round() as i64;
        row.stages.sort_by_key(|stage| stage.start_date);
    }

    debug!(
        "Laid out {} stages in {} rows at {:.2} px/day",
        stages.len(),
        rows.len(),
        scale
    );

    TimelineLayout {
        rows,
        project_start_date: project_start,
        project_end_date: project_end,
        pixels_per_day: scale,
    }
}

/// Greedy packing over start-sorted stages, looking back at the last row only.
fn pack_rows(sorted: Vec<Stage>) -> Vec<TimelineRow> {
    let mut rows: Vec<TimelineRow> = Vec::new();

    for stage in sorted {
        let index = rows.len();
        match rows.last_mut() {
            Some(last) if !last.overlaps_any(&stage) => {
                trace!("Stage {} joins row {}", stage.id, index - 1);
                last.stages.push(stage);
            }
            _ => {
                trace!("Stage {} opens row {}", stage.id, index);
                rows.push(TimelineRow::with_stage(stage));
            }
        }
    }

    rows
}
