//! The trace-group export job, Kafka variant.

use crate::{
    derive::{derive_trace_block, TraceGroupFlags},
    errors::JobError,
};
use klay_domain::{correlate_trace_block, wire::BlockPayload, wire::TraceBlockPayload};
use klay_executor::ProgressLogger;
use klay_export::ItemExporter;
use klay_primitives::validate_range;
use klay_rpc::{requests, BatchProvider, RpcError, RpcErrorKind};
use klay_segment::{Reassembler, SegmentSource, TracePayload};
use std::sync::Arc;
use tracing::{info, warn};

/// Where the job stopped: the partition and offset of the last processed
/// payload's final segment, published so an outer driver can resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KafkaJobOutcome {
    /// Partition of the last processed message.
    pub partition: i32,
    /// Offset of the last processed message.
    pub offset: i64,
}

/// Exports traces, contracts, and tokens from reassembled trace payloads on
/// the chain data fetcher's Kafka topic, correlating each payload with its
/// block body over RPC.
///
/// The consumer is single-threaded and the reassembler runs on the consumer
/// task. The job returns once a payload at or beyond `end_block` has been
/// processed; idle tail reads keep polling while the maximum block seen is
/// below the end of the range.
pub struct ExportTraceGroupKafkaJob<S: SegmentSource> {
    start_block: u64,
    end_block: u64,
    source: S,
    provider: Arc<dyn BatchProvider>,
    exporter: Arc<dyn ItemExporter>,
    enrich: bool,
    flags: TraceGroupFlags,
    start_partition: i32,
    start_offset: i64,
    log_percentage_step: u64,
}

impl<S: SegmentSource> std::fmt::Debug for ExportTraceGroupKafkaJob<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportTraceGroupKafkaJob")
            .field("start_block", &self.start_block)
            .field("end_block", &self.end_block)
            .field("start_partition", &self.start_partition)
            .field("start_offset", &self.start_offset)
            .finish_non_exhaustive()
    }
}

impl<S: SegmentSource> ExportTraceGroupKafkaJob<S> {
    /// Configures the job. At least one flag must be set and the range must
    /// be well-formed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start_block: u64,
        end_block: u64,
        source: S,
        provider: Arc<dyn BatchProvider>,
        exporter: Arc<dyn ItemExporter>,
        enrich: bool,
        flags: TraceGroupFlags,
        start_partition: i32,
        start_offset: i64,
        log_percentage_step: u64,
    ) -> Result<Self, JobError> {
        validate_range(start_block, end_block)?;
        if !flags.any() {
            return Err(JobError::InvalidOptions(
                "at least one of traces, contracts, or tokens must be exported".to_string(),
            ));
        }
        Ok(Self {
            start_block,
            end_block,
            source,
            provider,
            exporter,
            enrich,
            flags,
            start_partition,
            start_offset,
            log_percentage_step,
        })
    }

    /// Consumes segments until the range is covered, exporting every
    /// payload within `[start_block, end_block]`.
    pub async fn run(mut self) -> Result<KafkaJobOutcome, JobError> {
        self.exporter.open()?;

        let total = self.end_block - self.start_block + 1;
        let progress = ProgressLogger::new(
            "export_trace_group_kafka",
            Some(total),
            self.log_percentage_step,
        );

        let mut reassembler = Reassembler::new();
        let mut outcome =
            KafkaJobOutcome { partition: self.start_partition, offset: self.start_offset };
        let mut max_block_seen: Option<u64> = None;

        let result = loop {
            let segment = match self.source.next_segment().await {
                Ok(segment) => segment,
                Err(err) => break Err(JobError::from(err)),
            };
            let Some(segment) = segment else {
                // tail of the log; keep polling until the range is covered
                if max_block_seen.is_some_and(|seen| seen >= self.end_block) {
                    break Ok(());
                }
                warn!(
                    target: "trace_group_kafka",
                    end_block = self.end_block,
                    max_block_seen,
                    "no message within the poll timeout, waiting for the range to be covered"
                );
                continue;
            };

            let mut failure = None;
            for payload in reassembler.insert(segment) {
                max_block_seen = Some(max_block_seen.unwrap_or(0).max(payload.block_number));

                if payload.block_number < self.start_block
                    || payload.block_number > self.end_block
                {
                    // bounding the buffer is the caller's duty per the
                    // reassembly contract; out-of-range runs are dropped
                    info!(
                        target: "trace_group_kafka",
                        block_number = payload.block_number,
                        "dropping out-of-range trace payload"
                    );
                    continue;
                }

                outcome = KafkaJobOutcome { partition: payload.partition, offset: payload.offset };
                if let Err(err) = self.export_payload(&payload, &progress).await {
                    failure = Some(err);
                    break;
                }
            }
            if let Some(err) = failure {
                break Err(err);
            }

            if max_block_seen.is_some_and(|seen| seen >= self.end_block) {
                break Ok(());
            }
        };

        self.exporter.close()?;
        result.map(|()| outcome)
    }

    async fn export_payload(
        &self,
        payload: &TracePayload,
        progress: &ProgressLogger,
    ) -> Result<(), JobError> {
        let decoded: TraceBlockPayload = serde_json::from_slice(&payload.data)?;

        let calls = requests::block_with_consensus_info_by_number([decoded.block_number]);
        let mut results = self.provider.make_batch_request(&calls).await?;
        let block: BlockPayload = serde_json::from_value(
            results
                .pop()
                .ok_or(RpcErrorKind::Fatal(RpcError::CountMismatch { want: 1, got: 0 }))?,
        )?;

        let trace_block = correlate_trace_block(decoded.block_number, decoded.result, &block)?;
        let trace_count = derive_trace_block(
            &trace_block,
            self.enrich,
            self.flags,
            self.provider.as_ref(),
            self.exporter.as_ref(),
        )
        .await?;
        progress.track(1, trace_count);
        Ok(())
    }
}
