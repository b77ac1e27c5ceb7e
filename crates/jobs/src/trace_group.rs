//! The trace-group export job, RPC variant.

use crate::{
    derive::{derive_trace_block, TraceGroupFlags},
    errors::{fatal, work_error, JobError},
};
use klay_domain::{
    correlate_trace_block,
    wire::{BlockPayload, TraceResultEntry},
};
use klay_executor::{BatchWorkExecutor, ProgressLogger, WorkError};
use klay_export::ItemExporter;
use klay_primitives::validate_range;
use klay_rpc::{requests, BatchProvider, ProviderSource, RpcErrorKind};
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

/// `debug_traceBlockByNumber` responses are large; trace calls go out in
/// sub-batches of at most this many blocks to bound the message size.
const TRACE_CHUNK: usize = 20;

/// Exports traces, contracts, and tokens over an inclusive block range,
/// fetching traces via `debug_traceBlockByNumber` and correlating them with
/// block bodies by block number.
pub struct ExportTraceGroupJob {
    start_block: u64,
    end_block: u64,
    batch_size: usize,
    max_workers: usize,
    providers: Arc<dyn ProviderSource>,
    exporter: Arc<dyn ItemExporter>,
    enrich: bool,
    flags: TraceGroupFlags,
    log_percentage_step: u64,
    detailed_trace_log: bool,
}

impl std::fmt::Debug for ExportTraceGroupJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportTraceGroupJob")
            .field("start_block", &self.start_block)
            .field("end_block", &self.end_block)
            .field("batch_size", &self.batch_size)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl ExportTraceGroupJob {
    /// Configures the job. At least one flag must be set and the range must
    /// be well-formed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start_block: u64,
        end_block: u64,
        batch_size: usize,
        max_workers: usize,
        providers: Arc<dyn ProviderSource>,
        exporter: Arc<dyn ItemExporter>,
        enrich: bool,
        flags: TraceGroupFlags,
        log_percentage_step: u64,
        detailed_trace_log: bool,
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
            batch_size,
            max_workers,
            providers,
            exporter,
            enrich,
            flags,
            log_percentage_step,
            detailed_trace_log,
        })
    }

    /// Runs the export over the worker pool.
    pub async fn run(&self) -> Result<(), JobError> {
        self.exporter.open()?;

        let total = self.end_block - self.start_block + 1;
        let mut progress =
            ProgressLogger::new("export_trace_group", Some(total), self.log_percentage_step);
        if self.detailed_trace_log {
            progress = progress.with_detailed_log();
        }
        let executor = BatchWorkExecutor::new(self.batch_size, self.max_workers);

        let providers = Arc::clone(&self.providers);
        let exporter = Arc::clone(&self.exporter);
        let enrich = self.enrich;
        let flags = self.flags;
        let provider_cell: OnceLock<Result<Arc<dyn BatchProvider>, RpcErrorKind>> = OnceLock::new();

        let result = executor
            .execute(
                self.start_block..=self.end_block,
                move |batch: Vec<u64>| {
                    let provider = provider_cell.get_or_init(|| providers.provider()).clone();
                    let exporter = Arc::clone(&exporter);
                    async move {
                        let provider = provider.map_err(work_error)?;
                        export_batch(&batch, provider.as_ref(), enrich, flags, exporter.as_ref())
                            .await
                    }
                },
                Arc::new(progress),
            )
            .await;

        executor.shutdown();
        self.exporter.close()?;
        result.map_err(Into::into)
    }
}

async fn export_batch(
    batch: &[u64],
    provider: &dyn BatchProvider,
    enrich: bool,
    flags: TraceGroupFlags,
    exporter: &dyn ItemExporter,
) -> Result<u64, WorkError> {
    // block bodies for correlation; blocks without transactions have no
    // traces and are skipped outright
    let block_calls = requests::block_with_consensus_info_by_number(batch.iter().copied());
    let block_results = provider.make_batch_request(&block_calls).await.map_err(work_error)?;

    let mut blocks: HashMap<u64, BlockPayload> = HashMap::new();
    for result in block_results {
        let payload: BlockPayload = serde_json::from_value(result).map_err(fatal)?;
        if payload.transactions.is_empty() {
            continue;
        }
        let number = klay_primitives::hex_to_u64(payload.number.as_deref())
            .map_err(fatal)?
            .ok_or_else(|| WorkError::Fatal("block payload without a number".to_string()))?;
        blocks.insert(number, payload);
    }

    let mut trace_count = 0u64;
    let trace_calls = requests::trace_block_by_number(batch.iter().copied());
    for chunk in trace_calls.chunks(TRACE_CHUNK) {
        let chunk_results = provider.make_batch_request(chunk).await.map_err(work_error)?;
        for (call, result) in chunk.iter().zip(chunk_results) {
            let entries: Vec<TraceResultEntry> =
                serde_json::from_value(result).map_err(fatal)?;
            if entries.is_empty() {
                continue;
            }
            let Some(block) = blocks.get(&call.id) else {
                continue;
            };

            let tx_traces = entries.into_iter().map(|entry| entry.result).collect();
            let trace_block =
                correlate_trace_block(call.id, tx_traces, block).map_err(fatal)?;
            trace_count +=
                derive_trace_block(&trace_block, enrich, flags, provider, exporter).await?;
        }
    }

    Ok(trace_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use klay_export::test_utils::CollectingExporter;
    use klay_rpc::test_utils::MockBatchProvider;
    use klay_rpc::{RpcCall, RpcError};
    use serde_json::{json, Value};

    struct MockSource(Arc<MockBatchProvider>);

    impl ProviderSource for MockSource {
        fn provider(&self) -> Result<Arc<dyn BatchProvider>, RpcErrorKind> {
            Ok(Arc::clone(&self.0) as Arc<dyn BatchProvider>)
        }
    }

    fn block_body(number: u64) -> Value {
        json!({
            "number": format!("0x{number:x}"),
            "hash": format!("0x{number:064x}"),
            "parentHash": format!("0x{:064x}", number - 1),
            "logsBloom": "0x0",
            "transactionsRoot": format!("0x{:064x}", 1),
            "stateRoot": format!("0x{:064x}", 2),
            "receiptsRoot": format!("0x{:064x}", 3),
            "size": "0x2f2",
            "extraData": "0x",
            "gasUsed": "0x5208",
            "timestamp": "0x5ddd2365",
            "timestampFoS": "0x13",
            "blockscore": "0x1",
            "totalBlockScore": "0x1",
            "governanceData": "0x",
            "voteData": "0x",
            "committee": ["0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0"],
            "proposer": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
            "reward": "0x2abe3e13f3e82beb9708705164e4cc726d9802c3",
            "transactions": [{
                "transactionHash": format!("0x{:064x}", 0xbb),
                "transactionIndex": "0x0",
                "status": "0x1",
            }],
        })
    }

    fn creation_trace() -> Value {
        json!([{
            "result": {
                "type": "CREATE",
                "from": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                "to": "0xcee8faf64bb97a73bb51e115aa89c17ffa8dd167",
                "value": "0x0",
                "gas": "0x7a120",
                "gasUsed": "0x5208",
                "input": "0x6080",
                "output": "0x63a9059cbb",
            }
        }])
    }

    fn handler(call: &RpcCall) -> Result<Value, RpcErrorKind> {
        match call.method {
            "klay_getBlockWithConsensusInfoByNumber" => Ok(block_body(call.id)),
            "debug_traceBlockByNumber" => Ok(creation_trace()),
            other => {
                Err(RpcError::Server { code: -32601, message: format!("no {other}") }.fatal())
            }
        }
    }

    #[tokio::test]
    async fn creation_trace_yields_trace_and_contract() {
        let provider = MockBatchProvider::new(handler);
        let exporter = Arc::new(CollectingExporter::new());
        let job = ExportTraceGroupJob::new(
            10,
            10,
            1,
            1,
            Arc::new(MockSource(Arc::new(provider))),
            Arc::clone(&exporter) as Arc<dyn ItemExporter>,
            true,
            TraceGroupFlags::ALL,
            10,
            false,
        )
        .unwrap();
        job.run().await.unwrap();

        assert_eq!(exporter.records_of("trace").len(), 1);
        assert_eq!(exporter.records_of("contract").len(), 1);
        // a single PUSH4 does not satisfy any token standard
        assert!(exporter.records_of("token").is_empty());
    }
}
