use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notes_api::{
    app::{self, AppState},
    config::AppConfig,
    database::DatabaseManager,
};

#[derive(Parser, Debug)]
#[command(name = "notes-api", version, about = "Notes taking API server")]
struct Args {
    /// Interface to bind (overrides NOTES_API_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides NOTES_API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage backend: postgres or memory (overrides NOTES_STORE)
    #[arg(long)]
    store: Option<String>,
}

impl Args {
    /// Command-line values shadow the environment key they override
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "NOTES_API_HOST" => self.host.clone(),
            "NOTES_API_PORT" => self.port.map(|p| p.to_string()),
            "NOTES_STORE" => self.store.clone(),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notes_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_lookup(|key| args.lookup(key).or_else(|| std::env::var(key).ok()))
        .context("invalid configuration")?;
    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let stores = DatabaseManager::open(&config.database)
        .await
        .context("failed to open store")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, stores).context("failed to initialise token service")?;
    let router = app::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
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
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
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
