//! Boundary normalisation for Kaiten board cards.
//!
//! The board API is not uniform across versions: the group a card sits in
//! may be reported as `group_id`, as a nested `group.id`, or as `lane_id`,
//! and completion is spread over a status object, a numeric `state_id` and
//! a free-text `state`. Everything here turns those shapes into the
//! canonical [`Task`] before it reaches progress or layout code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dates::parse_date;
use crate::error::CoreResult;
use crate::models::{ExternalRef, Task};

/// Status names that mean "done", compared case-insensitively by equality or containment.
const COMPLETED_STATUS_NAMES: [&str; 8] = [
    "завершена",
    "завершено",
    "completed",
    "готово",
    "done",
    "closed",
    "выполнена",
    "закрыта",
];

/// Kaiten's `state_id` for cards in a done column.
const DONE_STATE_ID: i64 = 3;

/// A card exactly as the board API returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub state_id: Option<Value>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub group_id: Option<Value>,
    /// Nested group object; other shapes are kept but never resolved.
    #[serde(default)]
    pub group: Option<Value>,
    #[serde(default)]
    pub lane_id: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<Value>,
}

impl RawCard {
    /// Card id as a string, or `None` when missing, empty or zero.
    pub fn card_id(&self) -> Option<String> {
        let id = ExternalRef::from_json(self.id.as_ref()?)?;
        match id.as_str().trim() {
            "" | "0" => None,
            _ => Some(id.as_str().to_string()),
        }
    }

    /// Card title, falling back to an empty string for odd shapes.
    pub fn title_text(&self) -> String {
        match &self.title {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Last update time, when reported as a parseable date string.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match &self.updated_at {
            Some(Value::String(s)) => parse_date(s).ok(),
            _ => None,
        }
    }
}

/// Resolve the group a card belongs to, trying `group_id`, then `group.id`,
/// then `lane_id`.
pub fn resolve_group_ref(card: &RawCard) -> Option<ExternalRef> {
    let nested = match &card.group {
        Some(Value::Object(group)) => group.get("id"),
        _ => None,
    };
    [card.group_id.as_ref(), nested, card.lane_id.as_ref()]
        .into_iter()
        .flatten()
        .find_map(ExternalRef::from_json)
}

/// Whether the card is done according to any of the board's signals.
pub fn is_card_completed(card: &RawCard) -> bool {
    if let Some(Value::Object(status)) = &card.status {
        let flag = |key: &str| status.get(key).and_then(Value::as_bool) == Some(true);
        if flag("is_closed") || flag("closed") {
            return true;
        }
        let name = status
            .get("name")
            .filter(|v| !v.is_null())
            .or_else(|| status.get("title"))
            .map(value_text)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if !name.is_empty()
            && COMPLETED_STATUS_NAMES
                .iter()
                .any(|done| name == *done || name.contains(done))
        {
            return true;
        }
    }

    if card.state_id.as_ref().and_then(Value::as_i64) == Some(DONE_STATE_ID) {
        return true;
    }

    let state = card
        .state
        .as_ref()
        .map(value_text)
        .unwrap_or_default()
        .to_lowercase();
    matches!(state.as_str(), "done" | "завершено" | "3")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert a raw card into a canonical task tagged with `stage_id`.
///
/// Returns `None` for cards without a usable id.
pub fn normalize_card(card: &RawCard, stage_id: Option<String>) -> Option<Task> {
    let id = card.card_id()?;
    Some(Task {
        id,
        title: card.title_text(),
        external_group_ref: resolve_group_ref(card),
        is_completed: is_card_completed(card),
        stage_id,
        updated_at: card.updated_at(),
    })
}

/// Extract cards from a board response.
///
/// Accepts a bare array or a `{ "data": [...] }` envelope; anything else is
/// treated as an empty board. Elements that are not card objects are skipped.
pub fn cards_from_response(response: Value) -> Vec<RawCard> {
    let items = match response {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Board response has no data array; treating board as empty");
                Vec::new()
            }
        },
        other => {
            warn!("Unexpected board response shape: {}", other);
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawCard>(item) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!("Skipping malformed card: {}", e);
                None
            }
        })
        .collect()
}

/// Parse a board response body.
pub fn parse_cards(body: &str) -> CoreResult<Vec<RawCard>> {
    let value: Value = serde_json::from_str(body)?;
    Ok(cards_from_response(value))
}

/// Order tasks for display: open tasks first in their original order, then
/// completed tasks with the most recently updated on top.
pub fn sort_tasks_for_display(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| match (a.is_completed, b.is_completed) {
        (false, true) => std::cmp::Ordering::Less,
        (true, false) => std::cmp::Ordering::Greater,
        (true, true) => b.updated_at.cmp(&a.updated_at),
        (false, false) => std::cmp::Ordering::Equal,
    });
    sorted
}
