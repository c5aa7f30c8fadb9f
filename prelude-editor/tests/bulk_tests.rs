//! Bulk export against the in-memory store

use std::io::{Cursor, Read};

use chrono::{TimeZone, Utc};
use prelude_common::events::{EventBus, PreludeEvent};
use prelude_common::model::{create_empty_project, ProjectType};
use prelude_common::store::{MemoryProjectStore, ProjectStore};
use prelude_editor::bulk::{ExportJob, FailurePolicy, ItemResult, JobState, ERROR_MANIFEST};
use prelude_editor::ExportFormat;

async fn seed(store: &MemoryProjectStore, names: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for name in names {
        let project = create_empty_project(name, ProjectType::Band);
        ids.push(store.create(name, &project).await.unwrap().id);
    }
    ids
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    archive.file_names().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_archive_named_by_day_with_entry_per_project() {
    let store = MemoryProjectStore::new("owner");
    let ids = seed(&store, &["Alpha", "Beta Session"]).await;

    let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();
    let mut job = ExportJob::new(ids, ExportFormat::Json);
    let archive = job.run(&store, now).await.unwrap();

    assert_eq!(archive.name, "prelude_export_2025-02-01.zip");
    assert_eq!((archive.succeeded, archive.failed), (2, 0));
    assert_eq!(job.state(), JobState::Done);
    assert_eq!(job.progress().percent(), 100);

    let mut names = entry_names(&archive.bytes);
    names.sort();
    assert_eq!(names, vec!["Alpha_prelude.json", "Beta_Session_prelude.json"]);
}

#[tokio::test]
async fn test_missing_project_is_isolated_into_manifest() {
    let store = MemoryProjectStore::new("owner");
    let mut ids = seed(&store, &["Keep"]).await;
    ids.insert(0, "gone".to_string());

    let events = EventBus::new(16);
    let mut rx = events.subscribe();
    let mut job = ExportJob::new(ids, ExportFormat::Pdf).with_events(events);
    let archive = job.run(&store, Utc::now()).await.unwrap();

    assert_eq!((archive.succeeded, archive.failed), (1, 1));
    assert!(matches!(&job.results()[0], ItemResult::Failure { id, .. } if id == "gone"));

    let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    let mut manifest = String::new();
    zip.by_name(ERROR_MANIFEST).unwrap().read_to_string(&mut manifest).unwrap();
    assert!(manifest.starts_with("gone: "));
    assert!(zip.by_name("Keep_prelude.pdf").is_ok());

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            PreludeEvent::BulkExportProgress { current, total, succeeded, .. } => {
                progress.push((current, total, succeeded))
            }
            PreludeEvent::BulkExportFinished { succeeded, failed, .. } => {
                assert_eq!((succeeded, failed), (1, 1))
            }
            _ => {}
        }
    }
    assert_eq!(progress, vec![(1, 2, false), (2, 2, true)]);
}

#[tokio::test]
async fn test_abort_on_first_failure() {
    let store = MemoryProjectStore::new("owner");
    let mut ids = seed(&store, &["One", "Two"]).await;
    ids.insert(1, "gone".to_string());

    let mut job = ExportJob::new(ids, ExportFormat::Json).with_policy(FailurePolicy::AbortOnFirst);
    let err = job.run(&store, Utc::now()).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.progress().current, 1);
}

#[tokio::test]
async fn test_colliding_names_are_suffixed() {
    let store = MemoryProjectStore::new("owner");
    let ids = seed(&store, &["Same Name", "Same-Name", "Same Name"]).await;

    let mut job = ExportJob::new(ids, ExportFormat::Docx);
    let archive = job.run(&store, Utc::now()).await.unwrap();

    let mut names = entry_names(&archive.bytes);
    names.sort();
    assert_eq!(
        names,
        vec![
            "Same_Name_prelude.docx",
            "Same_Name_prelude_2.docx",
            "Same_Name_prelude_3.docx"
        ]
    );
}

#[tokio::test]
async fn test_other_owners_projects_fail() {
    let store = MemoryProjectStore::new("alice");
    let ids = seed(&store, &["Private"]).await;
    let mallory = store.for_owner("mallory");

    let mut job = ExportJob::new(ids, ExportFormat::Json);
    let archive = job.run(&mallory, Utc::now()).await.unwrap();
    assert_eq!((archive.succeeded, archive.failed), (0, 1));
    assert_eq!(entry_names(&archive.bytes), vec![ERROR_MANIFEST.to_string()]);
}

#[tokio::test]
async fn test_failed_item_returns_job_to_idle() {
    let store = MemoryProjectStore::new("owner");
    let mut ids = seed(&store, &["Later"]).await;
    ids.insert(0, "gone".to_string());

    let mut job = ExportJob::new(ids, ExportFormat::Json);
    let first = job.export_next(&store, Utc::now()).await.unwrap().unwrap();
    assert!(matches!(first, ItemResult::Failure { id, .. } if id == "gone"));
    assert_eq!(job.state(), JobState::Idle);
    assert_eq!(job.progress().current, 1);

    let second = job.export_next(&store, Utc::now()).await.unwrap().unwrap();
    assert!(second.is_success());
    assert_eq!(job.state(), JobState::Idle);
    assert!(job.export_next(&store, Utc::now()).await.is_none());
}
