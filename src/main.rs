use std::path::PathBuf;

use anyhow::Context;
use keel::config::Config;
use keel::server::Server;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("KEEL_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));

    let file_found = path.exists();
    let cfg = if file_found {
        Config::load(&path)?
    } else {
        Config::from_env()?
    };

    let level = cfg.max_log_level()?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();

    if !file_found {
        tracing::warn!(path = %path.display(), "Config file not found, using defaults");
    }
    tracing::info!(
        port = cfg.port,
        ssl_port = cfg.ssl_port,
        doc_root = %cfg.doc_root.display(),
        max_threads = cfg.max_threads,
        "Configuration loaded"
    );

    let server = Server::bind(&cfg).await?;
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut running = tokio::spawn(server.run(stop_rx));

    tokio::select! {
        res = &mut running => {
            return res.context("server task panicked")?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = stop_tx.send(true);
    running.await.context("server task panicked")??;
    tracing::info!("Server stopped");

    Ok(())
}
