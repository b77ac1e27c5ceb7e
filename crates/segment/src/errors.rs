//! Segment source errors.

use thiserror::Error;

/// An error while consuming segments from the partitioned log.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// The Kafka client failed.
    #[error("kafka error: {0}")]
    Kafka(String),
    /// A message arrived without the segment headers or with an unusable
    /// key.
    #[error("malformed segment message at {partition}/{offset}: {reason}")]
    Malformed {
        /// The partition the message arrived on.
        partition: i32,
        /// The message offset.
        offset: i64,
        /// What was wrong with it.
        reason: String,
    },
}
