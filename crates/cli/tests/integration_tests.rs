//! End-to-end integration tests for the Stageline CLI
//!
//! This test suite executes commands through the CLI command interface
//! against fixture files written into an isolated directory per test.
//!
//! Tests are organized into modules:
//! - `layout` - Row packing and scaling
//! - `progress` - Per-stage progress from snapshot tasks and card dumps
//! - `sync` - Board sync, snapshot write-back and fetch failures
//! - `timeline` - Rendered view state
//! - `output` - Format dispatch through `Command::execute`

mod common;

use common::*;
use serde_json::json;
use stageline_cli::output::OutputFormat;
use stageline_cli::snapshot::load_snapshot;
use stageline_cli::{
    CliError, Command, Inputs, LayoutCommand, ProgressCommand, SyncCommand, TimelineCommand,
};
use stageline_core::CoreError;
use stageline_core::KaitenConfig;

fn layout_cmd(sequential: bool) -> LayoutCommand {
    LayoutCommand {
        sequential,
        format: OutputFormat::Text,
    }
}

fn sync_cmd(output: Option<std::path::PathBuf>) -> SyncCommand {
    SyncCommand {
        output,
        format: OutputFormat::Text,
    }
}

fn timeline_cmd(select: Option<&str>, hover: Option<&str>) -> TimelineCommand {
    TimelineCommand {
        sequential: false,
        select: select.map(str::to_string),
        hover: hover.map(str::to_string),
        columns: 60,
        format: OutputFormat::Text,
    }
}

// =============================================================================
// LAYOUT TESTS
// =============================================================================

mod layout {
    use super::*;

    #[test]
    fn test_overlapping_stages_split_into_rows() {
        let ctx = TestContext::new();
        let report = layout_cmd(false).execute(&ctx.standard_inputs()).unwrap();

        let rows: Vec<Vec<&str>> = report
            .layout
            .rows
            .iter()
            .map(|row| row.stages.iter().map(|s| s.id.as_str()).collect())
            .collect();
        assert_eq!(rows, vec![vec!["A"], vec!["B", "C"]]);
        assert_eq!(report.layout.rows[0].offset, 0);
        assert_eq!(report.layout.rows[1].offset, 660);
        assert_eq!(report.layout.pixels_per_day, 165.0);
    }

    #[test]
    fn test_narrow_viewport_clamps_scale() {
        let ctx = TestContext::new();
        let inputs = ctx.standard_inputs().with_viewport_width(1000.0);
        let report = layout_cmd(false).execute(&inputs).unwrap();

        assert_eq!(report.layout.pixels_per_day, 50.0);
        assert_eq!(report.layout.rows[1].offset, 200);
    }

    #[test]
    fn test_wide_viewport_scales_within_bounds() {
        let ctx = TestContext::new();
        let inputs = ctx.standard_inputs().with_viewport_width(2400.0);
        let report = layout_cmd(false).execute(&inputs).unwrap();

        // 2400 * 0.9 / 24 days
        assert_eq!(report.layout.pixels_per_day, 90.0);
    }

    #[test]
    fn test_sequential_layout_is_one_row() {
        let ctx = TestContext::new();
        let report = layout_cmd(true).execute(&ctx.standard_inputs()).unwrap();
        assert_eq!(report.layout.rows.len(), 1);
        assert_eq!(report.layout.stage_count(), 3);
    }

    #[test]
    fn test_declared_project_dates_override_bounds() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        snapshot["project"]["start_date"] = json!("2023-12-30");
        snapshot["project"]["end_date"] = json!("2024-02-01");
        let inputs = Inputs::new(ctx.write_json("project.json", &snapshot));

        let report = layout_cmd(false).execute(&inputs).unwrap();
        assert_eq!(report.layout.rows[0].offset, 2 * 165);
        assert_eq!(report.layout.total_days(), 33.0);
    }

    #[test]
    fn test_invalid_stage_is_still_laid_out() {
        let ctx = TestContext::new();
        let inputs = Inputs::new(ctx.write_json(
            "project.json",
            &json!({
                "project": {"id": "p1", "name": "Odd"},
                "stages": [
                    {"id": "X", "name": "Inverted", "start_date": "2024-01-10", "end_date": "2024-01-01"}
                ]
            }),
        ));

        let report = layout_cmd(false).execute(&inputs).unwrap();
        assert_eq!(report.layout.stage_count(), 1);
    }

    #[test]
    fn test_empty_project_has_no_rows() {
        let ctx = TestContext::new();
        let inputs = Inputs::new(ctx.write_json(
            "project.json",
            &json!({"project": {"id": "p1", "name": "Empty"}}),
        ));
        let report = layout_cmd(false).execute(&inputs).unwrap();
        assert!(report.layout.rows.is_empty());
        assert_eq!(report.layout.pixels_per_day, 165.0);
    }
}

// =============================================================================
// PROGRESS TESTS
// =============================================================================

mod progress {
    use super::*;

    #[tokio::test]
    async fn test_progress_from_card_dump() {
        let ctx = TestContext::new();
        let cmd = ProgressCommand {
            format: OutputFormat::Text,
        };
        let report = cmd
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        let percentages: Vec<f64> = report.stages.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![100.0, 33.33, 0.0]);
        assert!(report.stages[0].effectively_completed);
        assert!(!report.stages[2].effectively_completed);
        assert_eq!(report.unassigned_tasks, 1);
        assert!(!report.project_fully_completed);
    }

    #[tokio::test]
    async fn test_progress_from_snapshot_tasks() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        snapshot["tasks"] = json!([
            {"id": "t1", "external_group_ref": 300, "is_completed": true},
            {"id": "t2", "external_group_ref": "300", "is_completed": false},
            {"id": "t3", "stage_id": "A", "is_completed": true}
        ]);
        let inputs = Inputs::new(ctx.write_json("project.json", &snapshot));

        let report = ProgressCommand {
            format: OutputFormat::Text,
        }
        .execute(&inputs)
        .await
        .unwrap();
        assert_eq!(report.stages[0].percentage, 100.0);
        assert_eq!(report.stages[1].total_count, 0);
        assert_eq!(report.stages[2].percentage, 50.0);
    }

    #[tokio::test]
    async fn test_fully_completed_project() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        for stage in snapshot["stages"].as_array_mut().unwrap() {
            stage["status"] = json!("completed");
        }
        let inputs = Inputs::new(ctx.write_json("project.json", &snapshot));

        let report = ProgressCommand {
            format: OutputFormat::Text,
        }
        .execute(&inputs)
        .await
        .unwrap();
        assert!(report.project_fully_completed);
        assert!(report.to_string().ends_with("All stages completed."));
    }
}

// =============================================================================
// SYNC TESTS
// =============================================================================

mod sync {
    use super::*;

    #[tokio::test]
    async fn test_sync_reports_counts() {
        let ctx = TestContext::new();
        let report = sync_cmd(None)
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        assert_eq!(report.board_id, 42);
        assert_eq!(report.tasks.len(), 6);
        assert_eq!(report.matched, 5);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.completed, 4);
        assert!(report.destination.is_none());
    }

    #[tokio::test]
    async fn test_sync_orders_open_tasks_first() {
        let ctx = TestContext::new();
        let report = sync_cmd(None)
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        let ids: Vec<&str> = report.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5", "3", "1", "2", "6"]);
    }

    #[tokio::test]
    async fn test_sync_writes_snapshot_with_replaced_tasks() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        snapshot["tasks"] = json!([{"id": "stale", "is_completed": false}]);
        let project = ctx.write_json("project.json", &snapshot);
        let cards = ctx.write_json("cards.json", &standard_cards());
        let inputs = Inputs::new(project).with_cards(cards);
        let output = ctx.path("synced.json");

        let report = sync_cmd(Some(output.clone()))
            .execute(&inputs)
            .await
            .unwrap();
        assert_eq!(report.destination, Some(output.display().to_string()));

        let written = load_snapshot(&output).unwrap();
        assert_eq!(written.tasks.len(), 6);
        assert!(written.tasks.iter().all(|t| t.id != "stale"));
        assert_eq!(written.stages.len(), 3);

        let api = written.tasks.iter().find(|t| t.id == "3").unwrap();
        assert_eq!(api.stage_id.as_deref(), Some("B"));
        assert!(api.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_synced_snapshot_feeds_progress() {
        let ctx = TestContext::new();
        let output = ctx.path("synced.json");
        sync_cmd(Some(output.clone()))
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        let report = ProgressCommand {
            format: OutputFormat::Text,
        }
        .execute(&Inputs::new(output))
        .await
        .unwrap();
        assert_eq!(report.stages[1].percentage, 33.33);
    }

    #[tokio::test]
    async fn test_sync_from_board_directory() {
        let ctx = TestContext::new();
        ctx.write_json("boards/42.json", &standard_cards());
        let inputs = ctx.standard_inputs().with_cards(ctx.path("boards"));

        let report = sync_cmd(None).execute(&inputs).await.unwrap();
        assert_eq!(report.tasks.len(), 6);
    }

    #[tokio::test]
    async fn test_sync_respects_limit() {
        let ctx = TestContext::new();
        let inputs = ctx.standard_inputs_with_cards().with_kaiten_config(KaitenConfig {
            domain: None,
            card_limit: 2,
        });
        let report = sync_cmd(None).execute(&inputs).await.unwrap();
        assert_eq!(report.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_without_board_ref_fails() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        snapshot["project"]
            .as_object_mut()
            .unwrap()
            .remove("kaiten_board_id");
        let project = ctx.write_json("project.json", &snapshot);
        let cards = ctx.write_json("cards.json", &standard_cards());

        let err = sync_cmd(None)
            .execute(&Inputs::new(project).with_cards(cards))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::MissingBoardRef { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_with_non_numeric_board_fails() {
        let ctx = TestContext::new();
        let mut snapshot = standard_snapshot();
        snapshot["project"]["kaiten_board_id"] = json!("board-x");
        let project = ctx.write_json("project.json", &snapshot);
        let cards = ctx.write_json("cards.json", &standard_cards());

        let err = sync_cmd(None)
            .execute(&Inputs::new(project).with_cards(cards))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::InvalidBoardRef { .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_with_missing_dump_is_fetch_error() {
        let ctx = TestContext::new();
        let inputs = ctx.standard_inputs().with_cards(ctx.path("absent.json"));

        let err = sync_cmd(None).execute(&inputs).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::Fetch { board_id: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_sync_with_malformed_dump_is_payload_error() {
        let ctx = TestContext::new();
        let cards = ctx.write_text("cards.json", "{\"data\": [");
        let inputs = ctx.standard_inputs().with_cards(cards);

        let err = sync_cmd(None).execute(&inputs).await.unwrap_err();
        assert!(matches!(err, CliError::Core(CoreError::Payload(_))));
    }

    #[tokio::test]
    async fn test_sync_with_unknown_envelope_yields_no_tasks() {
        let ctx = TestContext::new();
        let cards = ctx.write_json("cards.json", &json!({"error": "unauthorized"}));
        let inputs = ctx.standard_inputs().with_cards(cards);

        let report = sync_cmd(None).execute(&inputs).await.unwrap();
        assert!(report.tasks.is_empty());
    }
}

// =============================================================================
// TIMELINE TESTS
// =============================================================================

mod timeline {
    use super::*;

    #[tokio::test]
    async fn test_timeline_cells_carry_progress() {
        let ctx = TestContext::new();
        let report = timeline_cmd(None, None)
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        assert_eq!(report.view.rows.len(), 2);
        let design = &report.view.rows[0].cells[0];
        assert_eq!(design.progress, 100.0);
        assert_eq!(design.task_count, 2);
        assert!(design.is_effectively_completed);
        assert!(design.is_last);

        let build = &report.view.rows[1].cells[0];
        assert_eq!(build.completed_count, 1);
        assert!(!build.is_last);
        assert!(report.view.rows[1].cells[1].is_last);
    }

    #[tokio::test]
    async fn test_timeline_row_weights() {
        let ctx = TestContext::new();
        let report = timeline_cmd(None, None)
            .execute(&ctx.standard_inputs())
            .await
            .unwrap();

        let first = &report.view.rows[0];
        assert_eq!(first.leading_spacer_days, 0.0);
        assert_eq!(first.cells[0].duration_days, 9.0);
        assert_eq!(first.trailing_spacer_days, 15.0);
        assert!((first.total_weight() - 24.0).abs() < 1e-9);

        // Gaps between stages in a row carry no weight.
        let second = &report.view.rows[1];
        assert_eq!(second.leading_spacer_days, 4.0);
        assert_eq!(second.trailing_spacer_days, 0.0);
        assert!((second.total_weight() - 19.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_hover_wins_tooltip_over_selection() {
        let ctx = TestContext::new();
        let report = timeline_cmd(Some("A"), Some("B"))
            .execute(&ctx.standard_inputs())
            .await
            .unwrap();

        let tooltip = report.view.tooltip.unwrap();
        assert_eq!(tooltip.stage_id, "B");
        assert_eq!(tooltip.start_label, "5 янв");
        assert_eq!(tooltip.end_label, "15 янв");
        assert!(report.view.rows[0].cells[0].is_selected);
        assert!(report.view.rows[1].cells[0].is_hovered);
    }

    #[tokio::test]
    async fn test_unknown_hover_target_has_no_tooltip() {
        let ctx = TestContext::new();
        let report = timeline_cmd(None, Some("missing"))
            .execute(&ctx.standard_inputs())
            .await
            .unwrap();
        assert!(report.view.tooltip.is_none());
    }
}

// =============================================================================
// OUTPUT FORMAT TESTS
// =============================================================================

mod output {
    use super::*;

    #[tokio::test]
    async fn test_progress_json_output() {
        let ctx = TestContext::new();
        let cmd = Command::Progress(ProgressCommand {
            format: OutputFormat::Json,
        });
        let text = cmd
            .execute(&ctx.standard_inputs_with_cards())
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["project_id"], "p1");
        assert_eq!(json["stages"][1]["percentage"], 33.33);
        assert_eq!(json["stages"][1]["completed_count"], 1);
    }

    #[tokio::test]
    async fn test_layout_text_output() {
        let ctx = TestContext::new();
        let text = Command::Layout(layout_cmd(false))
            .execute(&ctx.standard_inputs())
            .await
            .unwrap();
        assert!(text.starts_with("Website relaunch: 01.01.24 - 25.01.24"));
        assert!(text.contains("Row 2 (offset 660 px)"));
    }

    #[tokio::test]
    async fn test_timeline_json_output() {
        let ctx = TestContext::new();
        let mut cmd = timeline_cmd(None, Some("C"));
        cmd.format = OutputFormat::Json;
        let text = Command::Timeline(cmd)
            .execute(&ctx.standard_inputs())
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["tooltip"]["stage_id"], "C");
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert!(json.get("columns").is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_io_error() {
        let ctx = TestContext::new();
        let err = Command::Layout(layout_cmd(false))
            .execute(&Inputs::new(ctx.path("nope.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
