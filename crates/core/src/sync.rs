//! Sync coordinator.
//!
//! Fetches every card on a project's board in one call and tags each with
//! the stage whose group reference matches. The result replaces whatever
//! task set the caller held for the project; there is no delta sync.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::kaiten::{RawCard, normalize_card, resolve_group_ref};
use crate::models::{ExternalRef, Project, Stage, Task};

/// Default page size requested from the board API.
pub const DEFAULT_CARD_LIMIT: usize = 1000;

/// Board connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaitenConfig {
    /// Kaiten workspace domain, used for diagnostics.
    pub domain: Option<String>,
    /// Maximum number of cards requested per board.
    pub card_limit: usize,
}

impl Default for KaitenConfig {
    fn default() -> Self {
        Self {
            domain: None,
            card_limit: DEFAULT_CARD_LIMIT,
        }
    }
}

/// Explicit state for one sync call, in place of module-level caches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncContext {
    pub config: KaitenConfig,
}

impl SyncContext {
    pub fn new(config: KaitenConfig) -> Self {
        Self { config }
    }
}

/// Source of raw cards for a board.
///
/// Implementations own transport, timeouts and retries; the coordinator
/// calls [`TaskFetcher::fetch_board_cards`] exactly once per sync.
pub trait TaskFetcher {
    fn fetch_board_cards(
        &self,
        config: &KaitenConfig,
        board_id: u64,
    ) -> impl Future<Output = CoreResult<Vec<RawCard>>> + Send;
}

/// Numeric board id of a project, or the precondition error explaining why not.
pub fn board_id_for(project: &Project) -> CoreResult<u64> {
    let board_ref = project
        .board_ref
        .as_ref()
        .filter(|r| !r.as_str().trim().is_empty())
        .ok_or_else(|| CoreError::MissingBoardRef {
            project_id: project.id.clone(),
        })?;

    board_ref.as_u64().ok_or_else(|| CoreError::InvalidBoardRef {
        project_id: project.id.clone(),
        value: board_ref.to_string(),
    })
}

/// Stage bound to `group_ref`, if any.
fn stage_for_group<'a>(stages: &'a [Stage], group_ref: &ExternalRef) -> Option<&'a Stage> {
    stages
        .iter()
        .find(|stage| stage.external_group_ref.as_ref() == Some(group_ref))
}

/// Fetch the project's board and return its cards as tasks tagged with stage ids.
///
/// Cards whose group matches no stage are kept with `stage_id` unset. Cards
/// without a usable id are skipped.
///
/// # Errors
///
/// Returns `CoreError::MissingBoardRef` or `CoreError::InvalidBoardRef` before
/// any fetch when the project has no usable board reference, and propagates
/// whatever error the fetcher reports.
pub async fn sync_project_tasks<F: TaskFetcher>(
    context: &SyncContext,
    project: &Project,
    fetcher: &F,
    stages: &[Stage],
) -> CoreResult<Vec<Task>> {
    let board_id = board_id_for(project)?;
    debug!(
        "Syncing project {} from board {} ({})",
        project.id,
        board_id,
        context.config.domain.as_deref().unwrap_or("default domain")
    );

    let cards = fetcher.fetch_board_cards(&context.config, board_id).await?;

    let mut tasks = Vec::with_capacity(cards.len());
    for card in &cards {
        let stage_id = resolve_group_ref(card)
            .and_then(|group_ref| stage_for_group(stages, &group_ref))
            .map(|stage| stage.id.clone());

        match normalize_card(card, stage_id) {
            Some(task) => tasks.push(task),
            None => warn!("Skipping card without id on board {}", board_id),
        }
    }

    debug!(
        "Synced {} tasks for project {} ({} matched to stages)",
        tasks.len(),
        project.id,
        tasks.iter().filter(|t| t.stage_id.is_some()).count()
    );

    Ok(tasks)
}

/// Proof that a sync for a project was started; redeemed with its result.
#[derive(Debug, PartialEq, Eq)]
pub struct SyncTicket {
    project_id: String,
    generation: u64,
}

impl SyncTicket {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    latest_generation: u64,
    tasks: Vec<Task>,
}

/// Per-project task sets that only accept the newest sync's result.
///
/// Overlapping syncs for one project are not serialised; instead each sync
/// takes a ticket, and a result is dropped if a newer ticket was issued for
/// the same project in the meantime. Accepted results replace the previous
/// set wholesale.
#[derive(Debug, Default)]
pub struct TaskCache {
    entries: HashMap<String, CacheEntry>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sync for `project_id`, superseding any in flight.
    pub fn begin(&mut self, project_id: &str) -> SyncTicket {
        let entry = self.entries.entry(project_id.to_string()).or_default();
        entry.latest_generation += 1;
        SyncTicket {
            project_id: project_id.to_string(),
            generation: entry.latest_generation,
        }
    }

    /// Store `tasks` if `ticket` is still the newest for its project.
    ///
    /// Returns whether the result was accepted.
    pub fn complete(&mut self, ticket: SyncTicket, tasks: Vec<Task>) -> bool {
        match self.entries.get_mut(&ticket.project_id) {
            Some(entry) if entry.latest_generation == ticket.generation => {
                entry.tasks = tasks;
                true
            }
            _ => {
                debug!(
                    "Discarding stale sync result for project {}",
                    ticket.project_id
                );
                false
            }
        }
    }

    /// Current task set for a project (empty if never synced).
    pub fn tasks(&self, project_id: &str) -> &[Task] {
        self.entries
            .get(project_id)
            .map_or(&[], |entry| entry.tasks.as_slice())
    }
}
