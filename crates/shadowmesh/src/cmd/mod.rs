//! Subcommand implementations

pub mod gateway;
pub mod ingest;
pub mod register;
pub mod replica;

use std::path::Path;

use anyhow::{Context, Result};
use shadowmesh_config::Config;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Searched in order when no `--config` is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["configs/shadowmesh.toml", "shadowmesh.toml"];

/// Load configuration and apply environment overrides
///
/// An explicit path must exist. Without one the default locations are tried
/// and built-in defaults are used when none is present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(found) => Config::from_file(found)
                .with_context(|| format!("failed to load config from {}", found.display()))?,
            None => Config::default(),
        },
    };

    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    Ok(config)
}

/// Token cancelled on Ctrl+C or SIGTERM
pub fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        trigger.cancel();
    });
    cancel
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
