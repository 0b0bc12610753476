mod common;

use common::{names, tab, Harness};
use pretty_assertions::assert_eq;
use serde_json::json;
use tabsync_core::{LoadOutcome, LocalCache, NotifyLevel, RemoteError, SaveOutcome};

#[tokio::test]
async fn explicit_save_sends_current_workspace_and_mirrors_locally() {
    let harness = Harness::new();
    harness.coordinator.import_tabs(vec![tab("A", &["rotor"]), tab("B", &[])]);
    harness.coordinator.cancel_pending_save();

    let outcome = harness.coordinator.save_to_server().await;

    assert_eq!(outcome, SaveOutcome::Saved);
    let puts = harness.remote.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(names(&puts[0]), vec!["A", "B"]);
    assert_eq!(harness.local_snapshot(), Some(puts[0].clone()));
    assert!(harness.coordinator.last_save_time().is_some());
    assert!(harness
        .notifier
        .contains(NotifyLevel::Success, "Production data saved to server."));
}

#[tokio::test]
async fn explicit_save_failure_is_reported_not_raised() {
    let harness = Harness::new();
    let error = RemoteError::Unavailable("HTTP 500".into());
    harness.remote.fail_puts(error.clone());
    harness.coordinator.add_empty_tab();
    harness.coordinator.cancel_pending_save();

    assert_eq!(
        harness.coordinator.save_to_server().await,
        SaveOutcome::Failed(error)
    );
    assert_eq!(harness.coordinator.last_save_time(), None);
    assert!(!harness.coordinator.is_save_in_flight());
    assert!(harness
        .notifier
        .contains(NotifyLevel::Error, "Failed to save data to server."));
}

#[tokio::test]
async fn explicit_load_replaces_workspace_wholesale() {
    let harness = Harness::new();
    harness.coordinator.import_tabs(vec![tab("local", &["plate"])]);
    harness.coordinator.cancel_pending_save();
    harness
        .remote
        .push_get(Ok(Some(json!([tab("X", &[]), tab("Y", &["screw"])]))));

    let outcome = harness.coordinator.load_from_server().await;

    assert_eq!(outcome, LoadOutcome::Loaded { tabs: 2 });
    assert_eq!(names(&harness.coordinator.snapshot().to_json()), vec!["X", "Y"]);
    assert_eq!(names(&harness.local_snapshot().expect("local")), vec!["X", "Y"]);
    let first = harness.coordinator.tab_ids()[0];
    assert_eq!(harness.coordinator.active_tab().map(|tab| tab.id()), Some(first));
    assert!(harness
        .notifier
        .contains(NotifyLevel::Success, "Loaded 2 production tabs from server."));
}

#[tokio::test]
async fn explicit_load_without_data_leaves_workspace_untouched() {
    let harness = Harness::new();
    harness.coordinator.import_tabs(vec![tab("local", &["plate"])]);
    harness.coordinator.cancel_pending_save();
    let before = harness.coordinator.snapshot();

    assert_eq!(harness.coordinator.load_from_server().await, LoadOutcome::NoData);
    assert_eq!(harness.coordinator.snapshot(), before);
    assert!(harness
        .notifier
        .contains(NotifyLevel::Info, "No production data found on server."));
}

#[tokio::test]
async fn explicit_load_failure_leaves_workspace_untouched() {
    let harness = Harness::new();
    harness.coordinator.import_tabs(vec![tab("local", &["plate"])]);
    harness.coordinator.cancel_pending_save();
    let before = harness.local.load(common::KEY);
    harness
        .remote
        .push_get(Err(RemoteError::Unavailable("dns".into())));

    let outcome = harness.coordinator.load_from_server().await;

    assert!(matches!(outcome, LoadOutcome::Failed(RemoteError::Unavailable(_))));
    assert_eq!(names(&harness.coordinator.snapshot().to_json()), vec!["local"]);
    assert_eq!(harness.local.load(common::KEY), before);
    assert!(harness
        .notifier
        .contains(NotifyLevel::Error, "Failed to load data from server."));
}

#[tokio::test]
async fn explicit_load_does_not_schedule_remote_write() {
    let harness = Harness::new();
    harness.remote.push_get(Ok(Some(json!([tab("X", &[])]))));

    harness.coordinator.load_from_server().await;

    assert_eq!(harness.coordinator.phase(), tabsync_core::SavePhase::Idle);
}
