use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use maker_api::cli::{Cli, Commands};
use maker_api::config::config;
use maker_api::database::Database;
use maker_api::routes::{app, RouterOptions};
use maker_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("maker_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config();
    config.validate()?;

    match cli.command() {
        Commands::InitDb => {
            let db = Database::connect(&config.database).await?;
            db.init_schema().await?;
            db.close().await;
            Ok(())
        }
        Commands::Serve { port } => serve(port).await,
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting maker-api in {:?} mode", config.environment);

    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    if config.database.init_schema {
        db.init_schema().await?;
    }

    let state = AppState::new(db.clone(), config)?;
    let tracker = state.tracker.clone();
    let router = app(state, RouterOptions::from(config));

    let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("maker-api listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pending = tracker.in_flight();
    if pending > 0 {
        tracing::warn!(pending, "Closing database with tracking events still in flight; they will be dropped");
    }
    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
