//! Replica read service command

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use shadowmesh_config::Config;
use shadowmesh_pipeline::PgReplicaStore;
use shadowmesh_replica::build_router;
use tokio::net::TcpListener;
use tracing::info;

use super::shutdown_token;

#[derive(Args, Debug)]
pub struct ReplicaArgs {
    /// Listen port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Serve replica reads until shutdown is requested
pub async fn run(args: ReplicaArgs, mut config: Config) -> Result<()> {
    if let Some(port) = args.port {
        config.replica.port = port;
    }
    config
        .require_replica()
        .context("replica configuration incomplete")?;

    let store = PgReplicaStore::connect(
        config.replica_database_url(),
        config.replica.max_connections,
    )
    .await
    .context("failed to connect to replica database")?;
    let app = build_router(Arc::new(store));

    let addr = config.replica.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind replica service to {}", addr))?;

    info!(addr = %addr, "replica service listening");

    let cancel = shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("replica server error")?;

    info!("replica service stopped");
    Ok(())
}
