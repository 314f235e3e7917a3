mod args;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use climate_dashboard::{
    command::CommandWriter,
    dashboard::{AppState, ViewSettings, router},
    db::{ControlStore, ReadingStore, migrate, new_pool},
    forecast::Forecaster,
    session::SessionStore,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let pool = new_pool(&args.database_url).await?;
    if !args.skip_migrations {
        migrate(&pool).await?;
    }

    let forecaster = Forecaster::load(&args.model_path)
        .with_context(|| format!("failed to load forecasting model: {:?}", args.model_path))?;

    let state = AppState {
        readings: ReadingStore::new(pool.clone()),
        controls: ControlStore::new(pool),
        forecaster: Arc::new(forecaster),
        commands: CommandWriter::new(&args.command_file),
        sessions: Arc::new(SessionStore::new()),
        settings: ViewSettings {
            timezone: args.timezone,
            cold_threshold: args.cold_threshold,
        },
    };

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    info!(addr = %args.listen, "dashboard listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")
}
