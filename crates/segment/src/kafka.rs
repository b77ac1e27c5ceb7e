//! The Kafka segment source.

use crate::{errors::SegmentError, reassembler::Segment};
use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::{BorrowedMessage, Headers, Message},
    Offset, TopicPartitionList,
};
use std::time::Duration;

/// A source of trace segments.
///
/// `next_segment` returns `Ok(None)` when the tail of the log is reached
/// and no message arrives within the poll timeout; the trace-group job uses
/// that to decide whether to keep waiting for its range to be covered.
#[async_trait]
pub trait SegmentSource: Send {
    /// Pulls the next segment, or `None` on an idle tail read.
    async fn next_segment(&mut self) -> Result<Option<Segment>, SegmentError>;
}

/// Connection parameters for the trace topic.
#[derive(Clone, Debug)]
pub struct KafkaSourceConfig {
    /// Broker list.
    pub bootstrap_servers: String,
    /// Consumer group id.
    pub group_id: String,
    /// The trace topic.
    pub topic: String,
    /// The partition this job consumes; the consumer stays pinned to it.
    pub partition: i32,
    /// The offset to start from, supplied by the outer driver.
    pub offset: i64,
    /// How long a tail read waits before reporting no data.
    pub poll_timeout: Duration,
}

/// A [SegmentSource] over an rdkafka [StreamConsumer] pinned to a single
/// (topic, partition, offset).
pub struct KafkaSegmentSource {
    consumer: StreamConsumer,
    poll_timeout: Duration,
}

impl std::fmt::Debug for KafkaSegmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSegmentSource").finish_non_exhaustive()
    }
}

impl KafkaSegmentSource {
    /// Connects and assigns the configured partition at the given offset.
    ///
    /// Offsets are managed by the caller, not the group coordinator, so
    /// auto-commit stays off.
    pub fn connect(config: &KafkaSourceConfig) -> Result<Self, SegmentError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|err| SegmentError::Kafka(err.to_string()))?;

        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&config.topic, config.partition, Offset::Offset(config.offset))
            .map_err(|err| SegmentError::Kafka(err.to_string()))?;
        consumer.assign(&assignment).map_err(|err| SegmentError::Kafka(err.to_string()))?;

        Ok(Self { consumer, poll_timeout: config.poll_timeout })
    }
}

#[async_trait]
impl SegmentSource for KafkaSegmentSource {
    async fn next_segment(&mut self) -> Result<Option<Segment>, SegmentError> {
        match tokio::time::timeout(self.poll_timeout, self.consumer.recv()).await {
            Err(_elapsed) => Ok(None),
            Ok(Err(err)) => Err(SegmentError::Kafka(err.to_string())),
            Ok(Ok(message)) => parse_message(&message).map(Some),
        }
    }
}

/// Decodes the segment headers: `totalSegments` and `segmentIdx` are 8-byte
/// big-endian integers, `producerId` is UTF-8, and the message key is the
/// block number as ASCII decimal.
fn parse_message(message: &BorrowedMessage<'_>) -> Result<Segment, SegmentError> {
    let malformed = |reason: String| SegmentError::Malformed {
        partition: message.partition(),
        offset: message.offset(),
        reason,
    };

    let key = message
        .key()
        .and_then(|key| std::str::from_utf8(key).ok())
        .and_then(|key| key.parse::<u64>().ok())
        .ok_or_else(|| malformed("key is not an ascii decimal block number".to_string()))?;

    let headers = message.headers().ok_or_else(|| malformed("no headers".to_string()))?;
    let mut total_segments = None;
    let mut segment_idx = None;
    let mut producer_id = None;
    for header in headers.iter() {
        match (header.key, header.value) {
            ("totalSegments", Some(value)) => total_segments = be_u64(value),
            ("segmentIdx", Some(value)) => segment_idx = be_u64(value),
            ("producerId", Some(value)) => {
                producer_id = std::str::from_utf8(value).ok().map(str::to_string);
            }
            _ => {}
        }
    }

    Ok(Segment {
        key,
        producer_id: producer_id.ok_or_else(|| malformed("missing producerId".to_string()))?,
        total_segments: total_segments
            .ok_or_else(|| malformed("missing totalSegments".to_string()))?,
        segment_idx: segment_idx.ok_or_else(|| malformed("missing segmentIdx".to_string()))?,
        value: message.payload().unwrap_or_default().to_vec(),
        partition: message.partition(),
        offset: message.offset(),
    })
}

fn be_u64(value: &[u8]) -> Option<u64> {
    value.try_into().ok().map(u64::from_be_bytes)
}
