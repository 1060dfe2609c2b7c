//! CLI commands for Stageline
//!
//! This module contains all subcommand implementations for the stl CLI.

pub mod layout;
pub mod progress;
pub mod sync;
pub mod timeline;

pub use layout::LayoutCommand;
pub use progress::ProgressCommand;
pub use sync::SyncCommand;
pub use timeline::TimelineCommand;

use std::path::PathBuf;

use clap::Subcommand;
use stageline_core::{
    KaitenConfig, LayoutOptions, SyncContext, Task, sync_project_tasks,
};

use crate::error::CliResult;
use crate::fetcher::FileFetcher;
use crate::output;
use crate::snapshot::{ProjectSnapshot, load_snapshot};

/// Where a command reads its data from.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    /// Project snapshot file
    pub project: PathBuf,
    /// Board card dump (file or per-board directory), if any
    pub cards: Option<PathBuf>,
    /// Viewport width in pixels, if known
    pub viewport_width: Option<f64>,
    /// Board access settings used when syncing from the card dump
    pub kaiten: KaitenConfig,
}

impl Inputs {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            cards: None,
            viewport_width: None,
            kaiten: KaitenConfig::default(),
        }
    }

    pub fn with_cards(mut self, cards: impl Into<PathBuf>) -> Self {
        self.cards = Some(cards.into());
        self
    }

    pub fn with_viewport_width(mut self, width: f64) -> Self {
        self.viewport_width = Some(width);
        self
    }

    pub fn with_kaiten_config(mut self, kaiten: KaitenConfig) -> Self {
        self.kaiten = kaiten;
        self
    }

    pub fn load_snapshot(&self) -> CliResult<ProjectSnapshot> {
        load_snapshot(&self.project)
    }

    /// Current tasks for the snapshot's project.
    ///
    /// Synced from the card dump when one is configured, otherwise the task
    /// set stored in the snapshot.
    pub async fn load_tasks(&self, snapshot: &ProjectSnapshot) -> CliResult<Vec<Task>> {
        match &self.cards {
            Some(path) => {
                let context = SyncContext::new(self.kaiten.clone());
                let fetcher = FileFetcher::new(path);
                let tasks =
                    sync_project_tasks(&context, &snapshot.project, &fetcher, &snapshot.stages)
                        .await?;
                Ok(tasks)
            }
            None => Ok(snapshot.tasks.clone()),
        }
    }

    /// Layout options for the snapshot's project and this viewport.
    pub fn layout_options(&self, snapshot: &ProjectSnapshot, sequential: bool) -> LayoutOptions {
        let options = LayoutOptions::new()
            .sequential(sequential)
            .with_project_bounds(snapshot.project.start_date, snapshot.project.end_date);
        match self.viewport_width {
            Some(width) => options.with_viewport_width(width),
            None => options,
        }
    }
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pack the project's stages into timeline rows
    Layout(LayoutCommand),
    /// Show completion progress per stage
    Progress(ProgressCommand),
    /// Sync the project's tasks from its board
    Sync(SyncCommand),
    /// Draw the project timeline with progress
    Timeline(TimelineCommand),
}

impl Command {
    /// Execute the command and render its report.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if inputs cannot be loaded or the sync fails.
    pub async fn execute(&self, inputs: &Inputs) -> CliResult<String> {
        match self {
            Command::Layout(cmd) => output::render(&cmd.execute(inputs)?, cmd.format),
            Command::Progress(cmd) => output::render(&cmd.execute(inputs).await?, cmd.format),
            Command::Sync(cmd) => output::render(&cmd.execute(inputs).await?, cmd.format),
            Command::Timeline(cmd) => output::render(&cmd.execute(inputs).await?, cmd.format),
        }
    }
}
