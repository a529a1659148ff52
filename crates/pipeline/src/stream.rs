//! Change streams
//!
//! A [`ChangeStream`] yields raw messages for the pipeline to process, one at
//! a time. [`ChannelStream`] is fed from a tokio channel; `KafkaStream`
//! (feature `kafka`) consumes the connector's topics through a consumer group.
//!
//! The pipeline calls [`ChangeStream::ack`] once a message has reached a
//! terminal outcome. Streams with durable positions only advance past a
//! message after it has been acknowledged.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Position of a message within a partitioned log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPosition {
    pub partition: i32,
    pub offset: i64,
}

/// One raw message from a change stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Topic the message was read from
    pub topic: String,
    /// Message body; `None` for tombstones
    pub payload: Option<Vec<u8>>,
    /// Log position, when the stream has one
    pub position: Option<StreamPosition>,
}

impl StreamMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: Some(payload.into()),
            position: None,
        }
    }

    /// A message without a body
    pub fn tombstone(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: None,
            position: None,
        }
    }

    /// Attach a log position
    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.position = Some(StreamPosition { partition, offset });
        self
    }
}

/// Source of change-stream messages
#[async_trait]
pub trait ChangeStream: Send {
    /// Next message, or `None` once the stream has ended
    async fn next_message(&mut self) -> Option<StreamMessage>;

    /// Mark `message` as handled
    ///
    /// Called after the message was written or dropped, never before.
    async fn ack(&mut self, _message: &StreamMessage) -> Result<()> {
        Ok(())
    }
}

/// Change stream fed through a bounded tokio channel
///
/// The stream ends when every sender has been dropped.
#[derive(Debug)]
pub struct ChannelStream {
    receiver: mpsc::Receiver<StreamMessage>,
}

impl ChannelStream {
    /// Create a stream and the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamMessage>, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self { receiver })
    }
}

#[async_trait]
impl ChangeStream for ChannelStream {
    async fn next_message(&mut self) -> Option<StreamMessage> {
        self.receiver.recv().await
    }
}

#[cfg(feature = "kafka")]
pub use kafka::KafkaStream;

#[cfg(feature = "kafka")]
mod kafka {
    use async_trait::async_trait;
    use rdkafka::Message;
    use rdkafka::config::ClientConfig;
    use rdkafka::consumer::{Consumer, StreamConsumer};
    use shadowmesh_config::KafkaConfig;
    use tracing::{info, warn};

    use super::{ChangeStream, StreamMessage, StreamPosition};
    use crate::error::{PipelineError, Result};

    /// Change stream backed by a Kafka consumer group
    ///
    /// Offsets start at the earliest retained message for a new group. The
    /// client commits in the background, but only offsets stored by
    /// [`ChangeStream::ack`], so a message is never committed before it has
    /// been processed. Delivery is at-least-once.
    pub struct KafkaStream {
        consumer: StreamConsumer,
    }

    impl KafkaStream {
        /// Join the configured consumer group and subscribe to `topics`
        pub fn subscribe(config: &KafkaConfig, topics: &[&str]) -> Result<Self> {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &config.brokers)
                .set("group.id", &config.group_id)
                .set("auto.offset.reset", "earliest")
                .set("enable.auto.commit", "true")
                .set("enable.auto.offset.store", "false")
                .create()
                .map_err(|e| PipelineError::stream(format!("create consumer: {}", e)))?;

            consumer
                .subscribe(topics)
                .map_err(|e| PipelineError::stream(format!("subscribe {:?}: {}", topics, e)))?;

            info!(
                brokers = %config.brokers,
                group_id = %config.group_id,
                ?topics,
                "kafka consumer subscribed"
            );
            Ok(Self { consumer })
        }
    }

    #[async_trait]
    impl ChangeStream for KafkaStream {
        async fn next_message(&mut self) -> Option<StreamMessage> {
            loop {
                match self.consumer.recv().await {
                    Ok(message) => {
                        return Some(StreamMessage {
                            topic: message.topic().to_owned(),
                            payload: message.payload().map(<[u8]>::to_vec),
                            position: Some(StreamPosition {
                                partition: message.partition(),
                                offset: message.offset(),
                            }),
                        });
                    }
                    // Broker hiccups are transient; the client reconnects on its own
                    Err(e) => warn!(error = %e, "kafka receive failed"),
                }
            }
        }

        async fn ack(&mut self, message: &StreamMessage) -> Result<()> {
            let Some(position) = message.position else {
                return Ok(());
            };
            // The committed offset is the next one to read
            self.consumer
                .store_offset(&message.topic, position.partition, position.offset + 1)
                .map_err(|e| {
                    PipelineError::stream(format!(
                        "store offset {}/{}@{}: {}",
                        message.topic, position.partition, position.offset, e
                    ))
                })
        }
    }
}
