//! prelude-server library
//!
//! Multi-tenant persistence for Prelude projects: SQLite storage scoped per
//! account, bearer-token authentication, administrator account management
//! and whole-database backup/restore.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod password;

pub use config::{AccountPolicy, ServerSettings};

/// Projects embed images as data URLs, so bodies can be large
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub accounts: AccountPolicy,
}

impl AppState {
    pub fn new(db: SqlitePool, accounts: AccountPolicy) -> Self {
        Self { db, accounts }
    }
}

/// Build application router
///
/// Health, login and registration are public; everything else needs a
/// bearer token, and `/api/admin` additionally needs the admin role.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let admin = Router::new()
        .route("/api/admin/users", get(api::admin::list_users).post(api::admin::create_user))
        .route(
            "/api/admin/users/:id",
            put(api::admin::update_user).delete(api::admin::delete_user),
        )
        .route("/api/admin/backup", get(api::admin::backup))
        .route("/api/admin/restore", post(api::admin::restore))
        .layer(middleware::from_fn(api::require_admin));

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/auth/me", get(api::account::me))
        .route("/api/auth/logout", post(api::account::logout))
        .route("/api/auth/change-password", put(api::account::change_password))
        .route(
            "/api/projects",
            get(api::projects::list_projects).post(api::projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(api::projects::get_project)
                .put(api::projects::update_project)
                .delete(api::projects::delete_project),
        )
        .route("/api/projects/:id/duplicate", post(api::projects::duplicate_project))
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/auth/login", post(api::account::login))
        .route("/api/auth/register", post(api::account::register))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
