//! prelude-server - persistence and accounts for the Prelude planner
//!
//! Serves the project API on port 3001 by default, storing everything in one
//! SQLite file inside the data folder.

use anyhow::{Context, Result};
use clap::Parser;
use prelude_common::config::{default_config_path, ensure_dir, load_toml_or_default};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prelude_server::config::{ServerCli, ServerToml, CONFIG_FILE_NAME};
use prelude_server::db::{self, users};
use prelude_server::{build_router, AppState, ServerSettings};

#[derive(Parser, Debug)]
#[command(name = "prelude-server")]
#[command(about = "Project storage and accounts for the Prelude planner")]
#[command(version)]
struct Args {
    /// Path to server.toml
    #[arg(short, long, env = "PRELUDE_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Folder holding the database file
    #[arg(long)]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(CONFIG_FILE_NAME));
    let toml: ServerToml =
        load_toml_or_default(config_path.as_deref()).context("Failed to load server configuration")?;
    let settings = ServerSettings::resolve(
        ServerCli {
            port: args.port,
            data_folder: args.data_folder,
        },
        toml,
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("prelude_server={},tower_http={}", settings.log_level, settings.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting prelude-server v{}", env!("CARGO_PKG_VERSION"));

    ensure_dir(&settings.data_folder).context("Failed to create data folder")?;
    let db_path = settings.database_path();
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    if users::ensure_seed_admin(&pool, &settings.seed_admin)
        .await
        .context("Failed to create seed administrator")?
    {
        info!("Sign in as {} and change the password", settings.seed_admin.email);
    }
    if settings.accounts.allow_registration {
        info!(
            require_approval = settings.accounts.require_approval,
            "Self-registration enabled"
        );
    }

    let app = build_router(AppState::new(pool.clone(), settings.accounts));

    let address = settings.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("prelude-server listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
