//! Lifecycle tests run against both store implementations.
//! The SQLite store uses an in-memory database — no external services.

use chrono::{Duration, Utc};

use civicbot_common::{Department, IssueType, NewReport, Priority, ReportStatus};
use civicbot_store::{MemoryStore, ReportFilter, ReportStore, SqliteStore};

fn pothole_report(reporter: &str) -> NewReport {
    NewReport::builder()
        .reporter_id(reporter.to_string())
        .issue_type(IssueType::Pothole)
        .description("Large pothole on Main Street".to_string())
        .location_text("Main Street".to_string())
        .department(IssueType::Pothole.department())
        .priority(Priority::Medium)
        .build()
}

fn garbage_report(reporter: &str) -> NewReport {
    NewReport::builder()
        .reporter_id(reporter.to_string())
        .issue_type(IssueType::Garbage)
        .description("Overflowing bins near the park".to_string())
        .location_text("Elm Park".to_string())
        .image_reference(Some("https://media.example/123.jpg".to_string()))
        .department(IssueType::Garbage.department())
        .priority(Priority::Low)
        .build()
}

async fn sqlite() -> SqliteStore {
    let store = SqliteStore::connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    store.migrate().await.expect("migrate");
    store
}

// ---------------------------------------------------------------------------
// Shared behavior suite
// ---------------------------------------------------------------------------

async fn create_and_get(store: &dyn ReportStore) {
    let id = store.create(pothole_report("+15551230001")).await.unwrap();
    assert!(id > 0);

    let report = store.get(id).await.unwrap().expect("report exists");
    assert_eq!(report.id, id);
    assert_eq!(report.issue_type, IssueType::Pothole);
    assert_eq!(report.department, Department::PublicWorks);
    assert_eq!(report.status, ReportStatus::Received);
    assert_eq!(report.priority, Priority::Medium);
    assert!(report.resolved_at.is_none());
    assert_eq!(report.created_at, report.updated_at);

    assert!(store.get(id + 100).await.unwrap().is_none());
}

async fn ids_are_unique_and_increasing(store: &dyn ReportStore) {
    let first = store.create(pothole_report("+15551230001")).await.unwrap();
    let second = store.create(garbage_report("+15551230002")).await.unwrap();
    assert!(second > first);
}

async fn resolved_at_is_stamped_once(store: &dyn ReportStore) {
    let id = store.create(pothole_report("+15551230001")).await.unwrap();

    assert!(store.update_status(id, ReportStatus::Resolved).await.unwrap());
    let first_stamp = store
        .get(id)
        .await
        .unwrap()
        .unwrap()
        .resolved_at
        .expect("resolved_at set");

    // Reopen and resolve again — the original stamp survives.
    assert!(store
        .update_status(id, ReportStatus::InProgress)
        .await
        .unwrap());
    assert!(store.update_status(id, ReportStatus::Resolved).await.unwrap());

    let report = store.get(id).await.unwrap().unwrap();
    assert_eq!(report.resolved_at, Some(first_stamp));
    assert_eq!(report.status, ReportStatus::Resolved);
}

async fn state_machine_guards_archived(store: &dyn ReportStore) {
    let id = store.create(pothole_report("+15551230001")).await.unwrap();

    // Archived is unreachable from received and in-progress.
    assert!(!store.update_status(id, ReportStatus::Archived).await.unwrap());
    assert!(store
        .update_status(id, ReportStatus::InProgress)
        .await
        .unwrap());
    assert!(!store.update_status(id, ReportStatus::Archived).await.unwrap());

    // Resolved → archived is allowed, and archived is terminal.
    assert!(store.update_status(id, ReportStatus::Resolved).await.unwrap());
    assert!(store.update_status(id, ReportStatus::Archived).await.unwrap());
    assert!(!store.update_status(id, ReportStatus::Received).await.unwrap());
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        ReportStatus::Archived
    );
}

async fn update_status_missing_id_returns_false(store: &dyn ReportStore) {
    assert!(!store
        .update_status(9999, ReportStatus::Resolved)
        .await
        .unwrap());
    assert!(!store.set_priority(9999, Priority::High).await.unwrap());
}

async fn set_priority_updates(store: &dyn ReportStore) {
    let id = store.create(pothole_report("+15551230001")).await.unwrap();
    assert!(store.set_priority(id, Priority::High).await.unwrap());
    assert_eq!(
        store.get(id).await.unwrap().unwrap().priority,
        Priority::High
    );
}

async fn list_filters_and_paginates(store: &dyn ReportStore) {
    for i in 0..3 {
        store
            .create(pothole_report(&format!("+1555123000{i}")))
            .await
            .unwrap();
    }
    let garbage_id = store.create(garbage_report("+15551239999")).await.unwrap();
    store
        .update_status(garbage_id, ReportStatus::Resolved)
        .await
        .unwrap();

    // No filter: everything, newest first.
    let (all, total) = store.list(&ReportFilter::default(), 1, 50).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].id, garbage_id);

    // Status + issue filters combine with AND.
    let filter = ReportFilter {
        status: Some(ReportStatus::Resolved),
        issue_type: Some(IssueType::Garbage),
        ..Default::default()
    };
    let (hits, total) = store.list(&filter, 1, 50).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(hits[0].id, garbage_id);

    // Substring search over description and location.
    let filter = ReportFilter {
        search: Some("main".to_string()),
        ..Default::default()
    };
    let (hits, total) = store.list(&filter, 1, 50).await.unwrap();
    assert_eq!(total, 3);
    assert!(hits.iter().all(|r| r.issue_type == IssueType::Pothole));

    // Pagination.
    let (page1, total) = store.list(&ReportFilter::default(), 1, 3).await.unwrap();
    let (page2, _) = store.list(&ReportFilter::default(), 2, 3).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(page1.len(), 3);
    assert_eq!(page2.len(), 1);
}

async fn stats_on_empty_store(store: &dyn ReportStore) {
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.resolved, 0);
    assert_eq!(stats.with_image, 0);
    assert!(stats.status_distribution.is_empty());
    assert!(stats.issue_type_distribution.is_empty());
    assert!(stats.department_distribution.is_empty());
    assert_eq!(stats.reports_last_7_days, 0);
    assert_eq!(stats.avg_resolution_days, 0.0);
}

async fn stats_counts_and_distributions(store: &dyn ReportStore) {
    let a = store.create(pothole_report("+15551230001")).await.unwrap();
    store.create(pothole_report("+15551230002")).await.unwrap();
    store.create(garbage_report("+15551230003")).await.unwrap();
    store.update_status(a, ReportStatus::Resolved).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.resolved, 1);
    assert_eq!(stats.with_image, 1);
    assert_eq!(stats.reports_last_7_days, 3);
    assert_eq!(stats.status_distribution.get("resolved"), Some(&1));
    assert_eq!(stats.status_distribution.get("received"), Some(&2));
    assert_eq!(stats.issue_type_distribution.get("pothole"), Some(&2));
    assert_eq!(stats.department_distribution.get("sanitation"), Some(&1));
    // Same-run resolution is effectively instantaneous but must be counted.
    assert!(stats.avg_resolution_days >= 0.0);
    assert!(stats.avg_resolution_days < 1.0);
}

async fn retention_archives_only_old_resolved(store: &dyn ReportStore) {
    let resolved_id = store.create(pothole_report("+15551230001")).await.unwrap();
    let open_id = store.create(garbage_report("+15551230002")).await.unwrap();
    store
        .update_status(resolved_id, ReportStatus::Resolved)
        .await
        .unwrap();

    // Cutoff in the past: nothing qualifies.
    let archived = store
        .archive_resolved_before(Utc::now() - Duration::days(365))
        .await
        .unwrap();
    assert_eq!(archived, 0);

    // Cutoff in the future: only the resolved report is archived.
    let archived = store
        .archive_resolved_before(Utc::now() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(archived, 1);
    assert_eq!(
        store.get(resolved_id).await.unwrap().unwrap().status,
        ReportStatus::Archived
    );
    assert_eq!(
        store.get(open_id).await.unwrap().unwrap().status,
        ReportStatus::Received
    );
}

// ---------------------------------------------------------------------------
// Memory store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn memory_create_and_get() {
    create_and_get(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_ids_are_unique_and_increasing() {
    ids_are_unique_and_increasing(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_resolved_at_is_stamped_once() {
    resolved_at_is_stamped_once(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_state_machine_guards_archived() {
    state_machine_guards_archived(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_update_status_missing_id_returns_false() {
    update_status_missing_id_returns_false(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_set_priority_updates() {
    set_priority_updates(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_list_filters_and_paginates() {
    list_filters_and_paginates(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_stats_on_empty_store() {
    stats_on_empty_store(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_stats_counts_and_distributions() {
    stats_counts_and_distributions(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_retention_archives_only_old_resolved() {
    retention_archives_only_old_resolved(&MemoryStore::new()).await;
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlite_create_and_get() {
    create_and_get(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_ids_are_unique_and_increasing() {
    ids_are_unique_and_increasing(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_resolved_at_is_stamped_once() {
    resolved_at_is_stamped_once(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_state_machine_guards_archived() {
    state_machine_guards_archived(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_update_status_missing_id_returns_false() {
    update_status_missing_id_returns_false(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_set_priority_updates() {
    set_priority_updates(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_list_filters_and_paginates() {
    list_filters_and_paginates(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_stats_on_empty_store() {
    stats_on_empty_store(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_stats_counts_and_distributions() {
    stats_counts_and_distributions(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_retention_archives_only_old_resolved() {
    retention_archives_only_old_resolved(&sqlite().await).await;
}

#[tokio::test]
async fn sqlite_migrate_is_idempotent() {
    let store = sqlite().await;
    store.migrate().await.expect("second migrate succeeds");
}
