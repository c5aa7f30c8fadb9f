//! Bulk export orchestrator
//!
//! Loads, renders and packages several projects into one zip archive,
//! strictly one project at a time. Per-item failures are either isolated
//! (recorded in an `export_errors.txt` manifest) or abort the batch.

use chrono::{DateTime, Utc};
use prelude_common::events::{EventBus, PreludeEvent};
use prelude_common::model::Project;
use prelude_common::store::ProjectStore;
use prelude_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::str::FromStr;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::{self, archive_name, file_name, EntryNames, ExportFormat};

/// Name of the failure manifest inside the archive
pub const ERROR_MANIFEST: &str = "export_errors.txt";

/// What to do when one project fails to load or render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Skip the item, list it in the manifest, keep going
    #[default]
    Isolate,
    /// Stop the batch and return the first error
    AbortOnFirst,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "abort-on-first" | "abort" => Ok(FailurePolicy::AbortOnFirst),
            other => Err(Error::Config(format!("unknown bulk failure policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    FetchingProject(usize),
    Rendering(usize),
    Packaging,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    /// Whole-number percentage; an empty batch counts as complete
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.current * 100) / self.total) as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemResult {
    Success {
        id: String,
        file_name: String,
        bytes: Vec<u8>,
    },
    Failure {
        id: String,
        reason: String,
    },
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemResult::Success { .. })
    }

    pub fn id(&self) -> &str {
        match self {
            ItemResult::Success { id, .. } | ItemResult::Failure { id, .. } => id,
        }
    }
}

/// A packaged archive ready to be written out
#[derive(Debug, Clone)]
pub struct BulkArchive {
    pub name: String,
    pub bytes: Vec<u8>,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct ExportJob {
    ids: Vec<String>,
    format: ExportFormat,
    policy: FailurePolicy,
    events: Option<EventBus>,
    state: JobState,
    progress: Progress,
    results: Vec<ItemResult>,
    names: EntryNames,
}

impl ExportJob {
    pub fn new(ids: Vec<String>, format: ExportFormat) -> Self {
        let total = ids.len();
        Self {
            ids,
            format,
            policy: FailurePolicy::default(),
            events: None,
            state: JobState::Idle,
            progress: Progress { current: 0, total },
            results: Vec::new(),
            names: EntryNames::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    fn emit(&self, event: PreludeEvent) {
        if let Some(events) = &self.events {
            events.emit_lossy(event);
        }
    }

    /// Load and render the next project, then return to `Idle`
    ///
    /// `None` once every id has been processed. An isolated failure is
    /// recorded and returned as an `ItemResult::Failure`; under
    /// `AbortOnFirst` the error is returned and the job is `Failed`.
    pub async fn export_next<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Option<Result<&ItemResult>> {
        let index = self.results.len();
        let id = self.ids.get(index)?.clone();

        let result = match self.export_one(store, index, &id, now).await {
            Ok(result) => result,
            Err(e) => {
                warn!(project_id = %id, error = %e, "Bulk export item failed");
                if self.policy == FailurePolicy::AbortOnFirst {
                    self.state = JobState::Failed;
                    return Some(Err(e));
                }
                ItemResult::Failure {
                    id: id.clone(),
                    reason: e.to_string(),
                }
            }
        };

        self.state = JobState::Idle;
        self.progress.current = index + 1;
        self.emit(PreludeEvent::BulkExportProgress {
            current: self.progress.current,
            total: self.progress.total,
            project_id: id,
            succeeded: result.is_success(),
        });
        self.results.push(result);
        self.results.last().map(Ok)
    }

    /// Run the batch against `store`; `now` dates the archive and documents
    pub async fn run<S: ProjectStore + ?Sized>(&mut self, store: &S, now: DateTime<Utc>) -> Result<BulkArchive> {
        info!(count = self.ids.len(), format = %self.format, "Starting bulk export");

        while let Some(step) = self.export_next(store, now).await {
            step?;
        }

        self.state = JobState::Packaging;
        let name = archive_name(now);
        let bytes = match package(&self.results) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state = JobState::Failed;
                return Err(e);
            }
        };

        let succeeded = self.results.iter().filter(|r| r.is_success()).count();
        let failed = self.results.len() - succeeded;
        self.state = JobState::Done;
        self.emit(PreludeEvent::BulkExportFinished {
            archive_name: name.clone(),
            succeeded,
            failed,
        });
        info!(archive = %name, succeeded, failed, "Bulk export finished");

        Ok(BulkArchive {
            name,
            bytes,
            succeeded,
            failed,
        })
    }

    async fn export_one<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        index: usize,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<ItemResult> {
        self.state = JobState::FetchingProject(index);
        let project = store.read(id).await?.into_project();

        self.state = JobState::Rendering(index);
        let stem = file_name(project.name(), self.format);
        let bytes = render_blocking(project, self.format, now).await?;
        let entry = self.names.claim(&stem);
        debug!(project_id = %id, entry = %entry, size = bytes.len(), "Rendered bulk export item");

        Ok(ItemResult::Success {
            id: id.to_string(),
            file_name: entry,
            bytes,
        })
    }
}

/// Rendering is CPU bound; keep it off the async workers
async fn render_blocking(project: Project, format: ExportFormat, now: DateTime<Utc>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || export::render(&project, format, now))
        .await
        .map_err(|e| Error::Internal(format!("render task failed: {}", e)))?
}

fn zip_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("archive packaging failed: {}", e))
}

/// Zip every success; failures go into the manifest
fn package(results: &[ItemResult]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut manifest = String::new();

    for result in results {
        match result {
            ItemResult::Success { file_name, bytes, .. } => {
                zip.start_file(file_name.as_str(), options).map_err(zip_error)?;
                zip.write_all(bytes)?;
            }
            ItemResult::Failure { id, reason } => {
                manifest.push_str(&format!("{}: {}\n", id, reason));
            }
        }
    }

    if !manifest.is_empty() {
        zip.start_file(ERROR_MANIFEST, options).map_err(zip_error)?;
        zip.write_all(manifest.as_bytes())?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress { current: 0, total: 0 }.percent(), 100);
        assert_eq!(Progress { current: 1, total: 3 }.percent(), 33);
        assert_eq!(Progress { current: 3, total: 3 }.percent(), 100);
    }

    #[test]
    fn test_manifest_only_when_failures() {
        let ok = vec![ItemResult::Success {
            id: "a".into(),
            file_name: "A_prelude.json".into(),
            bytes: b"{}".to_vec(),
        }];
        let bytes = package(&ok).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);

        let mixed = vec![
            ok[0].clone(),
            ItemResult::Failure {
                id: "b".into(),
                reason: "Not found: b".into(),
            },
        ];
        let bytes = package(&mixed).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name(ERROR_MANIFEST).is_ok());
    }

    #[test]
    fn test_policy_wire_names() {
        assert_eq!(serde_json::to_string(&FailurePolicy::AbortOnFirst).unwrap(), "\"abort-on-first\"");
        assert_eq!(FailurePolicy::default(), FailurePolicy::Isolate);
        assert_eq!("abort_on_first".parse::<FailurePolicy>().unwrap(), FailurePolicy::AbortOnFirst);
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }
}
