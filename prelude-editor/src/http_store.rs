//! Project store backed by the Prelude server's HTTP API
//!
//! Every request carries the caller's bearer token, so the server scopes all
//! reads and writes to that account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prelude_common::model::Project;
use prelude_common::store::{ProjectMeta, ProjectStore, ProjectUpdate, StoredProject};
use prelude_common::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("prelude/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProject {
    id: String,
    name: String,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WireProject {
    fn into_stored(self) -> Result<StoredProject> {
        Ok(StoredProject {
            data: Project::from_value(self.data)?,
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectEnvelope {
    project: WireProject,
}

#[derive(Debug, Deserialize)]
struct ProjectListEnvelope {
    projects: Vec<ProjectMeta>,
}

/// Create/update body; the document travels as a JSON string
#[derive(Debug, Serialize)]
struct WriteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct HttpProjectStore {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Persistence(e.to_string()))
}

impl HttpProjectStore {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Ok(Self {
            http_client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Sign in with email and password and keep the issued token
    pub async fn login(base_url: &str, email: &str, password: &str) -> Result<Self> {
        let http_client = build_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = http_client
            .post(format!("{}/api/auth/login", base_url))
            .json(&LoginBody { email, password })
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("login: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(status_error(status, "login", message));
        }

        let session: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("login: invalid response: {}", e)))?;
        debug!("Signed in to {}", base_url);

        Ok(Self {
            http_client,
            base_url,
            token: session.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/projects{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("{}: {}", what, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorEnvelope>().await {
            Ok(body) => body.error.message,
            Err(_) => status.to_string(),
        };
        Err(status_error(status, what, message))
    }

    async fn project_response(&self, request: reqwest::RequestBuilder, what: &str) -> Result<StoredProject> {
        let envelope: ProjectEnvelope = self
            .send(request, what)
            .await?
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("{}: invalid response: {}", what, e)))?;
        envelope.project.into_stored()
    }
}

fn status_error(status: StatusCode, what: &str, message: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => Error::Unauthenticated,
        StatusCode::FORBIDDEN => Error::Authorization(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::Validation(message),
        _ => Error::Persistence(format!("{}: {} {}", what, status.as_u16(), message)),
    }
}

fn write_body(name: Option<String>, project: Option<&Project>) -> Result<WriteBody> {
    let data = match project {
        Some(p) => Some(serde_json::to_string(p)?),
        None => None,
    };
    Ok(WriteBody { name, data })
}

#[async_trait]
impl ProjectStore for HttpProjectStore {
    async fn list(&self) -> Result<Vec<ProjectMeta>> {
        let envelope: ProjectListEnvelope = self
            .send(self.http_client.get(self.url("")), "list projects")
            .await?
            .json()
            .await
            .map_err(|e| Error::Persistence(format!("list projects: invalid response: {}", e)))?;
        debug!(count = envelope.projects.len(), "Listed projects");
        Ok(envelope.projects)
    }

    async fn create(&self, name: &str, project: &Project) -> Result<StoredProject> {
        let body = write_body(Some(name.to_string()), Some(project))?;
        let request = self.http_client.post(self.url("")).json(&body);
        self.project_response(request, "create project").await
    }

    async fn read(&self, id: &str) -> Result<StoredProject> {
        let request = self.http_client.get(self.url(&format!("/{}", id)));
        self.project_response(request, &format!("project {}", id)).await
    }

    async fn update(&self, id: &str, update: ProjectUpdate) -> Result<StoredProject> {
        let body = write_body(update.name, update.project.as_ref())?;
        let request = self.http_client.put(self.url(&format!("/{}", id))).json(&body);
        self.project_response(request, &format!("project {}", id)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self.http_client.delete(self.url(&format!("/{}", id)));
        self.send(request, &format!("project {}", id)).await?;
        Ok(())
    }

    async fn duplicate(&self, id: &str) -> Result<StoredProject> {
        let request = self.http_client.post(self.url(&format!("/{}/duplicate", id)));
        self.project_response(request, &format!("project {}", id)).await
    }
}
