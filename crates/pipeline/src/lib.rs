//! ShadowMesh - CDC Ingestion Pipeline
//!
//! Consumes row-level change events for the legacy store's `products` and
//! `reviews` tables and mirrors them into the replica store, repricing
//! products on the way.
//!
//! # Architecture
//!
//! ```text
//! [Change streams]                [Processor]                     [Replica]
//!  monolith.public.products ──→ task ──┐
//!                                      ├──→ decode ──→ reprice ──→ upsert / delete
//!  monolith.public.reviews  ──→ task ──┘
//! ```
//!
//! # Key Design
//!
//! - **Sequential per stream**: the next message is read only after the
//!   current one is written or dropped and acknowledged
//! - **Terminal outcomes**: every message ends as skipped, upserted, deleted
//!   or dropped; failures are logged and never retried
//! - **Last write wins**: writes are unconditional upserts keyed by id
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shadowmesh_pipeline::{
//!     ChangeEventProcessor, ChannelStream, IngestionPipeline, MemoryReplicaStore,
//!     StreamMessage, TopicMap,
//! };
//! use shadowmesh_protocol::{Decimal, SnapshotOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(MemoryReplicaStore::new());
//! let processor = ChangeEventProcessor::new(
//!     store.clone(),
//!     TopicMap::with_prefix("monolith"),
//!     SnapshotOptions::default(),
//! );
//!
//! let (tx, stream) = ChannelStream::channel(16);
//! let body = r#"{"payload":{"op":"c","after":{"id":1,"name":"Lamp","price":"10.00","stock":5}}}"#;
//! tx.send(StreamMessage::new("monolith.public.products", body)).await.unwrap();
//! drop(tx);
//!
//! let pipeline = IngestionPipeline::new(processor).with_stream(stream);
//! let metrics = pipeline.run(CancellationToken::new()).await;
//!
//! assert_eq!(metrics.upserted, 1);
//! assert_eq!(store.product(1).unwrap().product.dynamic_price, Decimal::new(1300, 2));
//! # }
//! ```

mod error;
mod metrics;
mod pipeline;
mod processor;
pub mod store;
mod stream;

pub use error::{PipelineError, Result, StoreError};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{DEFAULT_METRICS_INTERVAL, IngestionPipeline};
pub use processor::{ChangeEventProcessor, ProcessOutcome, TopicMap};
pub use store::{
    MemoryReplicaStore, PgReplicaStore, ReplicaReader, ReplicaStore, ReplicatedProduct,
    ReplicatedReview, ReviewSummary,
};
#[cfg(feature = "kafka")]
pub use stream::KafkaStream;
pub use stream::{ChangeStream, ChannelStream, StreamMessage, StreamPosition};

/// Default channel capacity for [`ChannelStream`]
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;
