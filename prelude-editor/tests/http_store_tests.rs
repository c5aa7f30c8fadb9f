//! HttpProjectStore against a live prelude-server router
//!
//! Each test binds the real router to a loopback port over an in-memory
//! database, so requests and responses go through the actual JSON envelopes.

use chrono::Utc;
use prelude_common::model::{create_empty_project, ProjectType};
use prelude_common::store::{ProjectStore, ProjectUpdate};
use prelude_common::Error;
use prelude_editor::bulk::ExportJob;
use prelude_editor::http_store::HttpProjectStore;
use prelude_editor::ExportFormat;
use prelude_server::config::{AccountPolicy, SeedAdmin};
use prelude_server::db::{init_memory_database, users};
use prelude_server::{build_router, AppState};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "changeme";

/// Serve a fresh server in the background and return its base URL
async fn spawn_server() -> String {
    let pool = init_memory_database().await.unwrap();
    let seed = SeedAdmin {
        email: ADMIN_EMAIL.into(),
        password: ADMIN_PASSWORD.into(),
        name: "Administrator".into(),
    };
    users::ensure_seed_admin(&pool, &seed).await.unwrap();
    let app = build_router(AppState::new(pool, AccountPolicy::default()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", address)
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let base = spawn_server().await;
    let result = HttpProjectStore::login(&base, ADMIN_EMAIL, "wrong").await;
    assert!(matches!(result, Err(Error::Unauthenticated)));

    let store = HttpProjectStore::new(&base, "not-a-token").unwrap();
    assert!(matches!(store.list().await, Err(Error::Unauthenticated)));
}

#[tokio::test]
async fn test_project_round_trip_over_http() {
    let base = spawn_server().await;
    let store = HttpProjectStore::login(&base, ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let mut document = create_empty_project("Live Record", ProjectType::Atmos);
    document.overview.client = "North Hall".into();
    let created = store.create("Live Record", &document).await.unwrap();
    assert_eq!(created.name, "Live Record");
    assert_eq!(created.data.id, created.id);
    assert_eq!(created.data.overview.client, "North Hall");
    assert!(created.data.atmos_config.is_some());

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].name, "Live Record");

    let mut edited = created.data.clone();
    edited.overview.notes = "Two nights".into();
    let updated = store
        .update(
            &created.id,
            ProjectUpdate {
                name: Some("Live Record (final)".into()),
                project: Some(edited),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Live Record (final)");
    assert_eq!(updated.data.overview.notes, "Two nights");

    let read = store.read(&created.id).await.unwrap();
    assert_eq!(read.data.overview.notes, "Two nights");
    assert_eq!(read.data.overview.client, "North Hall");

    let copy = store.duplicate(&created.id).await.unwrap();
    assert_eq!(copy.name, "Live Record (final) (Copy)");
    assert_ne!(copy.id, created.id);

    store.delete(&created.id).await.unwrap();
    assert!(matches!(store.read(&created.id).await, Err(Error::NotFound(_))));
    assert!(matches!(store.delete(&created.id).await, Err(Error::NotFound(_))));
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_export_reads_through_http_store() {
    let base = spawn_server().await;
    let store = HttpProjectStore::login(&base, ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let mut ids = Vec::new();
    for name in ["First", "Second"] {
        let project = create_empty_project(name, ProjectType::Band);
        ids.push(store.create(name, &project).await.unwrap().id);
    }
    ids.push("missing".to_string());

    let mut job = ExportJob::new(ids, ExportFormat::Csv);
    let archive = job.run(&store, Utc::now()).await.unwrap();
    assert_eq!((archive.succeeded, archive.failed), (2, 1));
}
