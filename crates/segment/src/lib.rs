#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod reassembler;
pub use reassembler::{Reassembler, Segment, TracePayload};

mod errors;
pub use errors::SegmentError;

mod kafka;
pub use kafka::{KafkaSegmentSource, KafkaSourceConfig, SegmentSource};
