//! Export shaping
//!
//! Every renderer is a pure function of one project and a generation
//! timestamp. Raw payloads are decoded and checked before any renderer runs.

pub mod daw;
pub mod document;
pub mod docx;
pub mod naming;
pub mod pdf;
pub mod reaper;
pub mod resolve;
pub mod rich_text;

use chrono::{DateTime, Utc};
use prelude_common::model::Project;
use prelude_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use naming::{archive_name, file_name, sanitize_name, EntryNames};

/// Output formats of a single-project export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Json,
    /// DAW track setup as CSV
    Csv,
    /// DAW track setup as a plain text sheet
    Text,
    /// REAPER project template
    Reaper,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Pdf,
        ExportFormat::Docx,
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Text,
        ExportFormat::Reaper,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
            ExportFormat::Reaper => "rpp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Reaper => "reaper",
            other => other.extension(),
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "text" | "txt" => Ok(ExportFormat::Text),
            "reaper" | "rpp" => Ok(ExportFormat::Reaper),
            other => Err(Error::Validation(format!("unknown export format '{}'", other))),
        }
    }
}

/// Render one project in the given format
pub fn render(project: &Project, format: ExportFormat, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Pdf => pdf::render(&document::build_plan(project, generated_at)),
        ExportFormat::Docx => docx::render(&document::build_plan(project, generated_at)),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(project)?),
        ExportFormat::Csv => Ok(daw::csv(project).into_bytes()),
        ExportFormat::Text => Ok(daw::text_sheet(project).into_bytes()),
        ExportFormat::Reaper => Ok(reaper::render(project).into_bytes()),
    }
}

/// Render a stored payload that has not been decoded yet
///
/// A payload without an overview section fails with `MissingData` before any
/// bytes are produced.
pub fn render_value(
    value: serde_json::Value,
    format: ExportFormat,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let project = Project::from_value(value)?;
    render(&project, format, generated_at)
}

/// Render a raw JSON payload
pub fn render_raw(raw: &str, format: ExportFormat, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| Error::Validation(format!("invalid project JSON: {}", e)))?;
    render_value(value, format, generated_at)
}
