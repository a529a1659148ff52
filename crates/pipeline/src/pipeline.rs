//! CDC ingestion pipeline
//!
//! One task per change stream. Each task handles its messages strictly in
//! order: the next message is read only after the current one has been
//! written or dropped, and acknowledged to its stream. Cancellation is
//! checked between messages, never in the middle of a write.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::processor::ChangeEventProcessor;
use crate::stream::ChangeStream;

/// Default interval between periodic metrics logs
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(30);

/// Runs change streams through a shared [`ChangeEventProcessor`]
pub struct IngestionPipeline {
    processor: Arc<ChangeEventProcessor>,
    streams: Vec<Box<dyn ChangeStream>>,
    metrics_interval: Duration,
}

impl IngestionPipeline {
    pub fn new(processor: ChangeEventProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
            streams: Vec::new(),
            metrics_interval: DEFAULT_METRICS_INTERVAL,
        }
    }

    /// Set the periodic metrics log interval
    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Add a change stream; each stream gets its own sequential task
    pub fn with_stream(mut self, stream: impl ChangeStream + 'static) -> Self {
        self.streams.push(Box::new(stream));
        self
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(self.processor.metrics())
    }

    /// Run until every stream has ended or `cancel` fires
    ///
    /// Returns the final metrics snapshot.
    pub async fn run(self, cancel: CancellationToken) -> MetricsSnapshot {
        let metrics = Arc::clone(self.processor.metrics());
        let stream_count = self.streams.len();

        let mut tasks = JoinSet::new();
        for (index, stream) in self.streams.into_iter().enumerate() {
            tasks.spawn(consume(
                index,
                stream,
                Arc::clone(&self.processor),
                cancel.clone(),
            ));
        }
        info!(streams = stream_count, "ingestion pipeline started");

        let mut ticker = tokio::time::interval(self.metrics_interval);
        ticker.tick().await;
        let mut last = metrics.snapshot();

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(())) => {}
                    Some(Err(e)) => error!(error = %e, "change stream task failed"),
                },
                _ = ticker.tick() => {
                    let current = metrics.snapshot();
                    let delta = current.diff(&last);
                    info!(
                        received = delta.received,
                        upserted = delta.upserted,
                        deleted = delta.deleted,
                        skipped = delta.skipped,
                        dropped = delta.dropped,
                        total_received = current.received,
                        "ingestion progress"
                    );
                    last = current;
                }
            }
        }

        let snapshot = metrics.snapshot();
        info!(
            received = snapshot.received,
            upserted = snapshot.upserted,
            deleted = snapshot.deleted,
            skipped = snapshot.skipped,
            dropped = snapshot.dropped,
            "ingestion pipeline stopped"
        );
        snapshot
    }
}

async fn consume(
    index: usize,
    mut stream: Box<dyn ChangeStream>,
    processor: Arc<ChangeEventProcessor>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(stream = index, "change stream cancelled");
                break;
            }
            message = stream.next_message() => message,
        };

        let Some(message) = message else {
            debug!(stream = index, "change stream ended");
            break;
        };
        processor.process_message(&message).await;

        // Dropped messages are acknowledged too; they are never retried
        if let Err(e) = stream.ack(&message).await {
            warn!(stream = index, topic = %message.topic, error = %e, "ack failed");
        }
    }
}
