//! Core engine for Stageline
//!
//! Computes stage progress from Kaiten board cards, packs a project's stages
//! into non-overlapping timeline rows, derives per-cell view state, and
//! synchronises a project's task set from its board.

pub mod dates;
pub mod error;
pub mod kaiten;
pub mod layout;
pub mod models;
pub mod progress;
pub mod render;
pub mod sync;

pub use dates::{days_between, format_date_display, format_date_short, parse_date};
pub use error::{CoreError, CoreResult};
pub use kaiten::{RawCard, normalize_card, parse_cards, sort_tasks_for_display};
pub use layout::{LayoutOptions, TimelineLayout, TimelineRow, calculate_timeline_layout};
pub use models::{ExternalRef, Project, ProjectStatus, Stage, StageStatus, Task};
pub use progress::{
    StageProgress, calculate_stage_progress, is_project_fully_completed,
    is_stage_effectively_completed, stage_progress,
};
pub use render::{CellView, InteractionState, RowView, TimelineView, Tooltip, render_timeline};
pub use sync::{KaitenConfig, SyncContext, SyncTicket, TaskCache, TaskFetcher, sync_project_tasks};
