//! Project endpoints
//!
//! Request bodies carry the document as a JSON string in `data`; responses
//! return it as an object inside `{"project": {...}}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use prelude_common::model::Project;
use prelude_common::store::{ProjectStore, ProjectUpdate, StoredProject};
use prelude_common::{Actor, Error};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{ApiError, ApiJson};
use crate::db::projects::ProjectSummary;
use crate::db::SqliteProjectStore;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub data: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectEnvelope {
    pub project: StoredProject,
}

#[derive(Debug, Serialize)]
pub struct ProjectListEnvelope {
    pub projects: Vec<ProjectSummary>,
}

fn store_for(state: &AppState, actor: &Actor) -> SqliteProjectStore {
    SqliteProjectStore::for_owner(state.db.clone(), actor.id.clone())
}

fn parse_document(raw: &str) -> Result<Project, ApiError> {
    Ok(Project::from_json(raw)?)
}

fn validate_project_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(Error::Validation("project name must not be empty".into()).into());
    }
    Ok(())
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ProjectListEnvelope>, ApiError> {
    let projects = store_for(&state, &actor).list_summaries().await?;
    Ok(Json(ProjectListEnvelope { projects }))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(body): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectEnvelope>), ApiError> {
    validate_project_name(&body.name)?;
    let document = parse_document(&body.data)?;

    let project = store_for(&state, &actor).create(&body.name, &document).await?;
    info!(project_id = %project.id, owner_id = %actor.id, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectEnvelope { project })))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ProjectEnvelope>, ApiError> {
    let project = store_for(&state, &actor).read(&id).await?;
    Ok(Json(ProjectEnvelope { project }))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectEnvelope>, ApiError> {
    if let Some(name) = body.name.as_deref() {
        validate_project_name(name)?;
    }
    let document = body.data.as_deref().map(parse_document).transpose()?;

    let update = ProjectUpdate {
        name: body.name,
        project: document,
    };
    let project = store_for(&state, &actor).update(&id, update).await?;
    Ok(Json(ProjectEnvelope { project }))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store_for(&state, &actor).delete(&id).await?;
    info!(project_id = %id, owner_id = %actor.id, "Project deleted");
    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

/// POST /api/projects/:id/duplicate
pub async fn duplicate_project(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProjectEnvelope>), ApiError> {
    let project = store_for(&state, &actor).duplicate(&id).await?;
    info!(source_id = %id, project_id = %project.id, "Project duplicated");
    Ok((StatusCode::CREATED, Json(ProjectEnvelope { project })))
}
