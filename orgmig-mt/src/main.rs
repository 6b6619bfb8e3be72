//! orgmig-mt: organization migration engine
//!
//! `serve` exposes the HTTP status surface and runs requested migrations in
//! the background; `run`, `resume` and `status` work in the foreground.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use orgmig_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use orgmig_common::events::EventBus;
use orgmig_common::MigrationStatus;

use orgmig_mt::models::MigrationTask;
use orgmig_mt::services::{request_migration, MigrationOrchestrator, MigrationRequest, MigrationSettings};
use orgmig_mt::source::{HttpSourceClient, SnapshotSource, SourceClient};
use orgmig_mt::AppState;

#[derive(Parser, Debug)]
#[command(name = "orgmig-mt", version, about = "Organization data migration engine")]
struct Args {
    /// Root folder holding the database and progress logs
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Read the source organization from a JSON export instead of the source API
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP status surface
    Serve {
        /// Overrides `bind_address` from config.toml
        #[arg(long)]
        bind: Option<String>,
    },
    /// Request a migration and run it in the foreground
    Run {
        /// Destination organization id
        #[arg(long)]
        org_id: i64,
        /// Organization id on the source system
        #[arg(long)]
        source_org_id: String,
        /// Organization name on the source system
        #[arg(long)]
        source_org_name: String,
        #[arg(long)]
        requested_by: Option<String>,
    },
    /// Continue an interrupted migration
    Resume { task_id: Uuid },
    /// Print the status of a migration task
    Status { task_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(toml_config.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting orgmig-mt v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(toml_config.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    let db = orgmig_mt::db::open_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let source = build_source(args.snapshot.as_deref(), &toml_config)?;
    let event_bus = EventBus::new(100);
    let settings = MigrationSettings {
        default_tps: toml_config.default_tps(),
        log_dir: Some(initializer.migration_log_dir()),
    };
    let orchestrator = Arc::new(MigrationOrchestrator::new(
        db.clone(),
        source,
        event_bus.clone(),
        settings,
    ));

    match args.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| toml_config.bind_address().to_string());
            let state = AppState::new(orchestrator, event_bus, toml_config.requested_by());
            let app = orgmig_mt::build_router(state);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("Listening on http://{}", bind);
            info!("Health check: http://{}/health", bind);

            axum::serve(listener, app).await?;
        }
        Command::Run {
            org_id,
            source_org_id,
            source_org_name,
            requested_by,
        } => {
            let request = MigrationRequest {
                org_id,
                source_org_id,
                source_org_name,
                requested_by,
            };
            let task = request_migration(
                &db,
                orchestrator.source(),
                &request,
                toml_config.requested_by(),
            )
            .await?;
            println!("Created migration task {}", task.task_id);

            let task = orchestrator.perform(task).await?;
            report(&task)?;
        }
        Command::Resume { task_id } => {
            let task = orchestrator.resume(task_id).await?;
            report(&task)?;
        }
        Command::Status { task_id } => {
            let task = orgmig_mt::db::tasks::load_task(&db, task_id)
                .await?
                .with_context(|| format!("Migration task {} not found", task_id))?;
            println!("{} {} (org {}, source org {})", task.task_id, task.status, task.org_id, task.source_org_id);
        }
    }

    Ok(())
}

fn build_source(snapshot: Option<&std::path::Path>, config: &TomlConfig) -> Result<Arc<dyn SourceClient>> {
    if let Some(path) = snapshot {
        let source = SnapshotSource::from_file(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        info!("Source: snapshot {}", path.display());
        return Ok(Arc::new(source));
    }

    let base_url = config
        .source_base_url
        .as_deref()
        .context("No source configured: set source_base_url in config.toml or pass --snapshot")?;
    let client = HttpSourceClient::new(base_url, config.source_api_token())?;
    info!("Source: {}", client.base_url());

    Ok(Arc::new(client))
}

fn report(task: &MigrationTask) -> Result<()> {
    println!("Migration task {} finished: {}", task.task_id, task.status);
    if task.status == MigrationStatus::Failed {
        anyhow::bail!("Migration task {} failed", task.task_id);
    }
    Ok(())
}
