//! Read gateway command

use anyhow::{Context, Result};
use clap::Args;
use shadowmesh_config::Config;
use shadowmesh_gateway::{TrafficRouter, build_router};
use tokio::net::TcpListener;
use tracing::info;

use super::shutdown_token;

#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Listen port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Initial replica weight, 0-100 (overrides config)
    #[arg(short, long)]
    pub weight: Option<u8>,
}

/// Serve the gateway until shutdown is requested
pub async fn run(args: GatewayArgs, mut config: Config) -> Result<()> {
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(weight) = args.weight {
        config.gateway.initial_weight = weight;
    }
    config.validate().context("invalid gateway settings")?;
    config
        .require_gateway()
        .context("gateway configuration incomplete")?;

    let router = TrafficRouter::from_config(&config.gateway)
        .context("failed to initialize traffic router")?;
    let app = build_router(router);

    let addr = config.gateway.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind gateway to {}", addr))?;

    info!(
        addr = %addr,
        legacy = %config.gateway.legacy_url,
        replica = %config.gateway.replica_url,
        weight = config.gateway.initial_weight,
        "gateway listening"
    );

    let cancel = shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("gateway server error")?;

    info!("gateway stopped");
    Ok(())
}
