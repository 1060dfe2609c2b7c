//! Card source backed by JSON dumps on disk
//!
//! The dump path may be a single file holding the board response, or a
//! directory with one `<board_id>.json` file per board.

use std::path::{Path, PathBuf};

use stageline_core::kaiten::parse_cards;
use stageline_core::{CoreError, CoreResult, KaitenConfig, RawCard, TaskFetcher};
use tracing::debug;

/// Reads board responses previously saved from the Kaiten API.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the response for `board_id`.
    pub fn board_path(&self, board_id: u64) -> PathBuf {
        if self.root.is_dir() {
            self.root.join(format!("{}.json", board_id))
        } else {
            self.root.clone()
        }
    }
}

fn fetch_error(board_id: u64, path: &Path, reason: impl std::fmt::Display) -> CoreError {
    CoreError::Fetch {
        board_id,
        message: format!("{}: {}", path.display(), reason),
    }
}

impl TaskFetcher for FileFetcher {
    async fn fetch_board_cards(
        &self,
        config: &KaitenConfig,
        board_id: u64,
    ) -> CoreResult<Vec<RawCard>> {
        let path = self.board_path(board_id);
        debug!("Reading cards for board {} from {}", board_id, path.display());

        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| fetch_error(board_id, &path, e))?;
        let mut cards = parse_cards(&body)?;
        cards.truncate(config.card_limit);
        Ok(cards)
    }
}
