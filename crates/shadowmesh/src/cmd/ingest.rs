//! CDC ingestion command
//!
//! Connects to the replica database, registers the CDC connector in the
//! background (optionally followed by the watchdog) and consumes the
//! products and reviews change streams until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use shadowmesh_config::Config;
use shadowmesh_connectors::{
    ConnectClient, ConnectorRegistrar, ConnectorWatchdog, RegistrationOutcome, RetryPolicy,
};
use shadowmesh_pipeline::{ChangeEventProcessor, IngestionPipeline, PgReplicaStore, TopicMap};
use shadowmesh_protocol::{SnapshotOptions, SourceTable};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::shutdown_token;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Do not register the CDC connector
    #[arg(long)]
    pub skip_register: bool,

    /// Do not run the connector watchdog
    #[arg(long)]
    pub no_watchdog: bool,
}

pub async fn run(args: IngestArgs, config: Config) -> Result<()> {
    config
        .require_ingest()
        .context("ingest configuration incomplete")?;

    let cancel = shutdown_token();

    let store = PgReplicaStore::connect(
        &config.ingest.replica_db_url,
        config.ingest.max_connections,
    )
    .await
    .context("failed to connect to replica database")?;

    let connector = if args.skip_register {
        None
    } else {
        Some(spawn_connector_tasks(&config, !args.no_watchdog, cancel.clone())?)
    };

    let topics = TopicMap::from_config(&config.ingest);
    let processor = ChangeEventProcessor::new(
        Arc::new(store),
        topics.clone(),
        SnapshotOptions {
            price_scale: config.ingest.price_scale,
        },
    );
    let pipeline = attach_streams(
        IngestionPipeline::new(processor).with_metrics_interval(config.ingest.metrics_interval),
        &config,
        &topics,
    )?;

    info!(
        products = topics.topic(SourceTable::Products),
        reviews = topics.topic(SourceTable::Reviews),
        "ingestion started"
    );
    let snapshot = pipeline.run(cancel.clone()).await;

    // Stream ended on its own; stop the connector tasks too
    cancel.cancel();
    if let Some(handle) = connector
        && let Err(e) = handle.await
    {
        warn!(error = %e, "connector task panicked");
    }

    info!(
        received = snapshot.received,
        upserted = snapshot.upserted,
        deleted = snapshot.deleted,
        dropped = snapshot.dropped,
        "ingestion stopped"
    );
    Ok(())
}

/// Register the connector, then watch it until cancelled
fn spawn_connector_tasks(
    config: &Config,
    watchdog: bool,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let client = ConnectClient::from_config(&config.connector, &config.ingest.topic_prefix)
        .context("failed to build connector client")?;
    let registrar = ConnectorRegistrar::new(client, RetryPolicy::from(&config.connector));
    let watchdog = watchdog && config.connector.watchdog;
    let interval = config.connector.watchdog_interval;

    Ok(tokio::spawn(async move {
        let outcome = registrar.register(&cancel).await;
        if matches!(outcome, RegistrationOutcome::Cancelled { .. }) {
            return;
        }
        // Exhaustion is already logged; ingestion keeps consuming whatever
        // the connector published before
        if watchdog {
            ConnectorWatchdog::new(registrar.into_control(), interval)
                .run(cancel)
                .await;
        }
    }))
}

#[cfg(feature = "kafka")]
fn attach_streams(
    mut pipeline: IngestionPipeline,
    config: &Config,
    topics: &TopicMap,
) -> Result<IngestionPipeline> {
    use shadowmesh_pipeline::KafkaStream;

    for table in SourceTable::ALL {
        let topic = topics.topic(table);
        let stream = KafkaStream::subscribe(&config.ingest.kafka, &[topic])
            .with_context(|| format!("failed to subscribe to {}", topic))?;
        pipeline = pipeline.with_stream(stream);
    }
    Ok(pipeline)
}

#[cfg(not(feature = "kafka"))]
fn attach_streams(
    _pipeline: IngestionPipeline,
    _config: &Config,
    _topics: &TopicMap,
) -> Result<IngestionPipeline> {
    anyhow::bail!("shadowmesh was built without the `kafka` feature; no change stream available")
}
