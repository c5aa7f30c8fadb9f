//! prelude - command line front end for the Prelude planner
//!
//! Talks to a Prelude server for stored projects; `render` works offline on a
//! JSON export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use prelude_common::config::{default_config_path, ensure_dir, load_toml_or_default};
use prelude_common::events::EventBus;
use prelude_common::store::ProjectStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prelude_editor::config::{CliOverrides, EditorSettings, EditorToml, CONFIG_FILE_NAME};
use prelude_editor::export::{self, file_name, ExportFormat};
use prelude_editor::mutation::{Mutation, MutationOutcome};
use prelude_editor::{EditingSession, ExportJob, FailurePolicy, HttpProjectStore};

#[derive(Parser, Debug)]
#[command(name = "prelude")]
#[command(about = "Pre-production planner for recording projects")]
#[command(version)]
struct Args {
    /// Path to editor.toml
    #[arg(long, global = true, env = "PRELUDE_EDITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Prelude server base URL
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// API token issued by the server at login
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print an API token for --token or PRELUDE_TOKEN
    Login {
        email: String,
        #[arg(long, env = "PRELUDE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List stored projects, most recently updated first
    List,

    /// Export one stored project
    Export {
        id: String,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export several stored projects into one zip archive
    BulkExport {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum)]
        policy: Option<FailurePolicy>,
    },

    /// Import a JSON export as a new project
    Import { file: PathBuf },

    /// Duplicate a stored project
    Duplicate { id: String },

    /// Apply a JSON array of mutations to a stored project and save it
    Edit { id: String, mutations: PathBuf },

    /// Render a JSON export without contacting the server
    Render {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(CONFIG_FILE_NAME));
    let toml: EditorToml =
        load_toml_or_default(config_path.as_deref()).context("Failed to load editor configuration")?;

    let policy_override = match &args.command {
        Command::BulkExport { policy, .. } => *policy,
        _ => None,
    };
    let settings = EditorSettings::resolve(
        CliOverrides {
            server_url: args.server_url.clone(),
            token: args.token.clone(),
            bulk_policy: policy_override,
            export_dir: None,
        },
        toml,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Login { email, password } => {
            let store = HttpProjectStore::login(&settings.server_url, &email, &password)
                .await
                .context("Sign-in failed")?;
            info!(server = %store.base_url(), "Signed in");
            println!("{}", store.token());
        }
        Command::Render { file, format, out } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let project = prelude_common::Project::from_json(&raw)?;
            let bytes = export::render(&project, format, Utc::now())?;
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            write_output(&dir, &file_name(project.name(), format), &bytes)?;
        }
        command => run_online(command, &settings).await?,
    }

    Ok(())
}

async fn run_online(command: Command, settings: &EditorSettings) -> Result<()> {
    let Some(token) = settings.api_token.as_deref() else {
        bail!("No API token configured; pass --token or set PRELUDE_TOKEN");
    };
    let store = Arc::new(HttpProjectStore::new(&settings.server_url, token)?);
    let events = EventBus::default();

    match command {
        Command::List => {
            for meta in store.list().await? {
                println!("{}  {}  {}", meta.id, meta.updated_at.format("%Y-%m-%d %H:%M"), meta.name);
            }
        }
        Command::Export { id, format, out } => {
            let project = store.read(&id).await?.into_project();
            let bytes = export::render(&project, format, Utc::now())?;
            let dir = out.unwrap_or_else(|| settings.export_dir.clone());
            write_output(&dir, &file_name(project.name(), format), &bytes)?;
        }
        Command::BulkExport { ids, format, out, .. } => {
            let mut progress = events.subscribe();
            let reporter = tokio::spawn(async move {
                while let Ok(event) = progress.recv().await {
                    if let prelude_common::events::PreludeEvent::BulkExportProgress {
                        current,
                        total,
                        project_id,
                        succeeded,
                    } = event
                    {
                        let status = if succeeded { "ok" } else { "failed" };
                        eprintln!("[{}/{}] {} {}", current, total, project_id, status);
                    }
                }
            });

            let mut job = ExportJob::new(ids, format)
                .with_policy(settings.bulk_policy)
                .with_events(events.clone());
            let archive = job.run(store.as_ref(), Utc::now()).await?;
            drop(job);
            drop(events);
            let _ = reporter.await;

            if archive.failed > 0 {
                warn!(failed = archive.failed, "Some projects could not be exported");
            }
            let dir = out.unwrap_or_else(|| settings.export_dir.clone());
            write_output(&dir, &archive.name, &archive.bytes)?;
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut session = EditingSession::new(store, events, settings.session_config());
            let id = session.import_project(&raw).await?;
            println!("{}", id);
        }
        Command::Duplicate { id } => {
            let copy = store.duplicate(&id).await?;
            println!("{}  {}", copy.id, copy.name);
        }
        Command::Edit { id, mutations } => {
            let raw = std::fs::read_to_string(&mutations)
                .with_context(|| format!("Failed to read {}", mutations.display()))?;
            let mutations: Vec<Mutation> =
                serde_json::from_str(&raw).context("Mutation file is not a JSON array of mutations")?;

            let mut session = EditingSession::new(store, events, settings.session_config());
            session.load_project(&id).await?;
            for mutation in mutations {
                let label = mutation.describe();
                match session.apply(mutation) {
                    MutationOutcome::Applied => info!(mutation = %label, "Applied"),
                    outcome => warn!(mutation = %label, ?outcome, "Mutation had no effect"),
                }
            }
            session.close().await?;
        }
        Command::Login { .. } | Command::Render { .. } => {
            bail!("this command does not use a stored token")
        }
    }

    Ok(())
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    ensure_dir(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}
