//! Change-event processor
//!
//! Applies one stream message to the replica store. Every message reaches
//! exactly one terminal [`ProcessOutcome`]; nothing is retried and nothing is
//! parked, so a poison message costs one log line and the loop moves on.

use std::sync::Arc;

use shadowmesh_config::IngestConfig;
use shadowmesh_protocol::{
    ChangeEvent, ProductSnapshot, ReviewSnapshot, Snapshot, SnapshotOptions, SourceTable,
};
use shadowmesh_transform::PricedProduct;
use tracing::{debug, error, warn};

use crate::metrics::PipelineMetrics;
use crate::store::{ReplicaStore, StoreResult};
use crate::stream::StreamMessage;

/// Terminal result of processing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No payload (tombstone or empty envelope)
    Skipped,
    /// Row inserted or overwritten
    Upserted { id: i64 },
    /// Delete applied; `existed` is false when the row was already absent
    Deleted { id: i64, existed: bool },
    /// Decode or storage failure, or a message from an unmapped topic
    Dropped { reason: String },
}

impl ProcessOutcome {
    /// Whether the message was dropped
    #[inline]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped { .. })
    }

    fn dropped(reason: impl ToString) -> Self {
        Self::Dropped {
            reason: reason.to_string(),
        }
    }
}

/// Maps stream topics to the mirrored table they carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMap {
    products: String,
    reviews: String,
}

impl TopicMap {
    pub fn new(products: impl Into<String>, reviews: impl Into<String>) -> Self {
        Self {
            products: products.into(),
            reviews: reviews.into(),
        }
    }

    /// Topics derived from the connector topic prefix
    pub fn with_prefix(prefix: &str) -> Self {
        Self::new(
            SourceTable::Products.topic(prefix),
            SourceTable::Reviews.topic(prefix),
        )
    }

    /// Topics from the ingest section (explicit names win over the prefix)
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.products_topic(), config.reviews_topic())
    }

    /// Topic carrying `table`
    pub fn topic(&self, table: SourceTable) -> &str {
        match table {
            SourceTable::Products => &self.products,
            SourceTable::Reviews => &self.reviews,
        }
    }

    /// Table carried by `topic`, if it is one of ours
    pub fn table(&self, topic: &str) -> Option<SourceTable> {
        if topic == self.products {
            Some(SourceTable::Products)
        } else if topic == self.reviews {
            Some(SourceTable::Reviews)
        } else {
            None
        }
    }
}

/// Decodes change events and writes them to a [`ReplicaStore`]
pub struct ChangeEventProcessor {
    store: Arc<dyn ReplicaStore>,
    topics: TopicMap,
    options: SnapshotOptions,
    metrics: Arc<PipelineMetrics>,
}

impl ChangeEventProcessor {
    pub fn new(store: Arc<dyn ReplicaStore>, topics: TopicMap, options: SnapshotOptions) -> Self {
        Self {
            store,
            topics,
            options,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn topics(&self) -> &TopicMap {
        &self.topics
    }

    /// Process a raw stream message, resolving its table from the topic
    pub async fn process_message(&self, message: &StreamMessage) -> ProcessOutcome {
        match self.topics.table(&message.topic) {
            Some(table) => self.process(table, message.payload.as_deref()).await,
            None => {
                self.metrics.record_received();
                self.metrics.record_dropped();
                warn!(topic = %message.topic, "message from unmapped topic dropped");
                ProcessOutcome::dropped(format!("unmapped topic '{}'", message.topic))
            }
        }
    }

    /// Process one message body for `table`
    pub async fn process(&self, table: SourceTable, payload: Option<&[u8]>) -> ProcessOutcome {
        self.metrics.record_received();

        let outcome = match payload {
            None => ProcessOutcome::Skipped,
            Some(bytes) => match table {
                SourceTable::Products => self.apply_product(bytes).await,
                SourceTable::Reviews => self.apply_review(bytes).await,
            },
        };

        match &outcome {
            ProcessOutcome::Skipped => self.metrics.record_skipped(),
            ProcessOutcome::Upserted { .. } => self.metrics.record_upserted(),
            ProcessOutcome::Deleted { .. } => self.metrics.record_deleted(),
            ProcessOutcome::Dropped { .. } => self.metrics.record_dropped(),
        }
        outcome
    }

    async fn apply_product(&self, bytes: &[u8]) -> ProcessOutcome {
        let event = match self.decode::<ProductSnapshot>(bytes) {
            Ok(Some(event)) => event,
            Ok(None) => return ProcessOutcome::Skipped,
            Err(outcome) => return outcome,
        };
        let id = event.key();

        match event {
            ChangeEvent::Delete { .. } => {
                let result = self.store.delete_product(id).await;
                finish_delete(SourceTable::Products, id, result)
            }
            upsert => {
                let product = PricedProduct::from(upsert.into_snapshot());
                let advice = product.recommendation();
                debug!(
                    id,
                    price = %product.price,
                    stock = product.stock,
                    dynamic_price = %product.dynamic_price,
                    demand_score = %product.demand_score,
                    action = %advice.action,
                    "product repriced"
                );
                let result = self.store.upsert_product(&product).await;
                finish_upsert(SourceTable::Products, id, result)
            }
        }
    }

    async fn apply_review(&self, bytes: &[u8]) -> ProcessOutcome {
        let event = match self.decode::<ReviewSnapshot>(bytes) {
            Ok(Some(event)) => event,
            Ok(None) => return ProcessOutcome::Skipped,
            Err(outcome) => return outcome,
        };
        let id = event.key();

        match event {
            ChangeEvent::Delete { .. } => {
                let result = self.store.delete_review(id).await;
                finish_delete(SourceTable::Reviews, id, result)
            }
            upsert => {
                let review = upsert.into_snapshot();
                let result = self.store.upsert_review(&review).await;
                finish_upsert(SourceTable::Reviews, id, result)
            }
        }
    }

    /// Decode the envelope; a failure is already turned into a dropped outcome
    fn decode<S: Snapshot>(
        &self,
        bytes: &[u8],
    ) -> Result<Option<ChangeEvent<S>>, ProcessOutcome> {
        match ChangeEvent::<S>::decode(bytes, &self.options) {
            Ok(Some(event)) => {
                let source = event.source();
                debug!(
                    table = %S::TABLE,
                    op = %event.operation(),
                    id = event.key(),
                    lsn = ?source.lsn,
                    ts_ms = ?source.ts_ms,
                    "change event decoded"
                );
                Ok(Some(event))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(table = %S::TABLE, error = %e, "undecodable change event dropped");
                Err(ProcessOutcome::dropped(e))
            }
        }
    }
}

fn finish_upsert(table: SourceTable, id: i64, result: StoreResult<()>) -> ProcessOutcome {
    match result {
        Ok(()) => ProcessOutcome::Upserted { id },
        Err(e) => {
            error!(table = %table, id, error = %e, "replica upsert failed, message dropped");
            ProcessOutcome::dropped(e)
        }
    }
}

fn finish_delete(table: SourceTable, id: i64, result: StoreResult<bool>) -> ProcessOutcome {
    match result {
        Ok(existed) => {
            if !existed {
                debug!(table = %table, id, "delete for absent row");
            }
            ProcessOutcome::Deleted { id, existed }
        }
        Err(e) => {
            error!(table = %table, id, error = %e, "replica delete failed, message dropped");
            ProcessOutcome::dropped(e)
        }
    }
}
