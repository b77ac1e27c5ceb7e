#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
pub use errors::JobError;

mod block_group;
pub use block_group::{BlockGroupFlags, ExportBlockGroupJob};

mod derive;
pub use derive::TraceGroupFlags;

mod trace_group;
pub use trace_group::ExportTraceGroupJob;

mod trace_group_kafka;
pub use trace_group_kafka::{ExportTraceGroupKafkaJob, KafkaJobOutcome};
