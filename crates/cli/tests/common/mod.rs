//! Test infrastructure for integration tests
//!
//! Provides an isolated fixture directory per test plus helpers for writing
//! project snapshots and board card dumps.

use std::path::PathBuf;

use serde_json::{Value, json};
use stageline_cli::Inputs;

/// Test context owning a unique temp directory
pub struct TestContext {
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context with an isolated directory.
    ///
    /// Each call creates a uniquely named temp directory using process ID,
    /// thread ID, and nanosecond timestamp to guarantee isolation.
    pub fn new() -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "stl-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&temp_dir).unwrap();

        Self { temp_dir }
    }

    /// Write `value` as JSON to `name` inside the context directory.
    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.temp_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    /// Write raw text to `name` inside the context directory.
    pub fn write_text(&self, name: &str, body: &str) -> PathBuf {
        let path = self.temp_dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    /// Path inside the context directory, without creating anything.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.join(name)
    }

    /// Write the standard fixture project and return inputs pointing at it.
    pub fn standard_inputs(&self) -> Inputs {
        let project = self.write_json("project.json", &standard_snapshot());
        Inputs::new(project)
    }

    /// Standard inputs plus the standard board card dump.
    pub fn standard_inputs_with_cards(&self) -> Inputs {
        let cards = self.write_json("cards.json", &standard_cards());
        self.standard_inputs().with_cards(cards)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Auto-cleanup on drop
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Project on board 42 with three stages: A and B overlap, C follows B.
pub fn standard_snapshot() -> Value {
    json!({
        "project": {
            "id": "p1",
            "name": "Website relaunch",
            "kaiten_board_id": 42
        },
        "stages": [
            {"id": "A", "name": "Design", "start_date": "2024-01-01", "end_date": "2024-01-10", "kaiten_group_id": 100},
            {"id": "B", "name": "Build", "start_date": "2024-01-05", "end_date": "2024-01-15", "kaiten_group_id": "200"},
            {"id": "C", "name": "Launch", "start_date": "2024-01-20", "end_date": "2024-01-25", "kaiten_group_id": 300}
        ]
    })
}

/// Board 42: Design 2/2 done, Build 1/3 done, Launch empty, one stray card.
pub fn standard_cards() -> Value {
    json!({"data": [
        {"id": 1, "title": "Wireframes", "group_id": 100, "status": {"name": "Готово"}},
        {"id": 2, "title": "Mockups", "group": {"id": 100}, "state_id": 3},
        {"id": 3, "title": "API", "lane_id": "200", "status": {"is_closed": true}, "updated_at": "2024-01-09T12:00:00Z"},
        {"id": 4, "title": "Frontend", "group_id": 200, "status": {"name": "В работе"}},
        {"id": 5, "title": "Tests", "group_id": 200},
        {"id": 6, "title": "Unrelated", "group_id": 999, "state": "done"},
        {"title": "No id"}
    ]})
}
