//! tally server binary — wires the store, identity and server together.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tally_server::{HeaderIdentity, ServerConfig, TallyServer};
use tally_store::{Database, MemoryRepository, Repository, SqliteRepository};

/// Real-time planning poker server.
#[derive(Parser, Debug)]
#[command(name = "tally", about = "Real-time planning poker server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8464")]
    port: u16,

    /// Path to the SQLite database. Omit for a non-durable in-memory store.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Length of generated session codes.
    #[arg(long, default_value = "10")]
    code_length: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("starting tally server");

    let repo: Arc<dyn Repository> = match &cli.db_path {
        Some(path) => {
            let db = Database::open(path)
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            Arc::new(SqliteRepository::new(db))
        }
        None => {
            tracing::warn!("no --db-path given, sessions will not survive a restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        code_length: cli.code_length,
        ..ServerConfig::default()
    };
    let server = TallyServer::new(config, repo, Arc::new(HeaderIdentity));
    let router = server.router();

    let addr = format!("{}:{}", server.config().host, server.config().port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    tracing::info!(%local, "tally server ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
