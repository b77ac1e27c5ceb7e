//! The block-group export job.

use crate::errors::{fatal, work_error, JobError};
use klay_domain::{
    extract_transfers_from_log,
    mappers::{BlockMapper, ReceiptLogMapper, ReceiptMapper, TransactionMapper},
    wire::BlockPayload,
    Block, ExportRecord,
};
use klay_executor::{BatchWorkExecutor, ProgressLogger, WorkError};
use klay_export::ItemExporter;
use klay_primitives::validate_range;
use klay_rpc::{requests, BatchProvider, ProviderSource, RpcErrorKind};
use std::sync::{Arc, OnceLock};

/// Which item types the block-group job emits.
#[derive(Clone, Copy, Debug)]
pub struct BlockGroupFlags {
    /// Emit block records.
    pub blocks: bool,
    /// Emit transaction records.
    pub transactions: bool,
    /// Emit receipt records.
    pub receipts: bool,
    /// Emit log records.
    pub logs: bool,
    /// Emit token transfer records.
    pub token_transfers: bool,
}

impl BlockGroupFlags {
    /// Everything on.
    pub const ALL: Self = Self {
        blocks: true,
        transactions: true,
        receipts: true,
        logs: true,
        token_transfers: true,
    };

    const fn any(&self) -> bool {
        self.blocks || self.transactions || self.receipts || self.logs || self.token_transfers
    }

    /// Receipts must be parsed to derive receipts, logs, or transfers.
    const fn require_receipts(&self) -> bool {
        self.receipts || self.logs || self.token_transfers
    }

    /// Logs must be parsed to derive logs or transfers.
    const fn require_logs(&self) -> bool {
        self.logs || self.token_transfers
    }
}

/// Exports blocks with their transactions, receipts, logs, and token
/// transfers over an inclusive block range.
///
/// One `klay_getBlockWithConsensusInfoByNumber` call per block fetches the
/// block body with receipts embedded; the mappers and the transfer
/// extractor derive the rest without further round trips.
pub struct ExportBlockGroupJob {
    start_block: u64,
    end_block: u64,
    batch_size: usize,
    max_workers: usize,
    providers: Arc<dyn ProviderSource>,
    exporter: Arc<dyn ItemExporter>,
    flags: BlockGroupFlags,
    mapper: Arc<BlockMapper>,
    log_percentage_step: u64,
}

impl std::fmt::Debug for ExportBlockGroupJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportBlockGroupJob")
            .field("start_block", &self.start_block)
            .field("end_block", &self.end_block)
            .field("batch_size", &self.batch_size)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl ExportBlockGroupJob {
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
        flags: BlockGroupFlags,
        log_percentage_step: u64,
    ) -> Result<Self, JobError> {
        validate_range(start_block, end_block)?;
        if !flags.any() {
            return Err(JobError::InvalidOptions(
                "at least one of the block-group item types must be exported".to_string(),
            ));
        }

        // the mapper tree mirrors the derivation dependencies
        let mut mapper = BlockMapper::new(enrich);
        if flags.transactions {
            mapper = mapper.with_transaction_mapper(TransactionMapper::new(enrich));
        }
        if flags.require_receipts() {
            let mut receipt_mapper = ReceiptMapper::new(enrich);
            if flags.require_logs() {
                receipt_mapper = receipt_mapper.with_log_mapper(ReceiptLogMapper::new(enrich));
            }
            mapper = mapper.with_receipt_mapper(receipt_mapper);
        }

        Ok(Self {
            start_block,
            end_block,
            batch_size,
            max_workers,
            providers,
            exporter,
            flags,
            mapper: Arc::new(mapper),
            log_percentage_step,
        })
    }

    /// Runs the export: open the exporter, fan the range out over the
    /// worker pool, close the exporter.
    pub async fn run(&self) -> Result<(), JobError> {
        self.exporter.open()?;

        let total = self.end_block - self.start_block + 1;
        let progress = Arc::new(ProgressLogger::new(
            "export_block_group",
            Some(total),
            self.log_percentage_step,
        ));
        let executor = BatchWorkExecutor::new(self.batch_size, self.max_workers);

        let providers = Arc::clone(&self.providers);
        let exporter = Arc::clone(&self.exporter);
        let mapper = Arc::clone(&self.mapper);
        let flags = self.flags;
        let provider_cell: OnceLock<Result<Arc<dyn BatchProvider>, RpcErrorKind>> = OnceLock::new();

        let result = executor
            .execute(
                self.start_block..=self.end_block,
                move |batch: Vec<u64>| {
                    // worker-scoped provider: the cell is cloned per worker,
                    // so each worker builds its own connection once
                    let provider = provider_cell.get_or_init(|| providers.provider()).clone();
                    let exporter = Arc::clone(&exporter);
                    let mapper = Arc::clone(&mapper);
                    async move {
                        let provider = provider.map_err(work_error)?;
                        export_batch(&batch, provider.as_ref(), &mapper, flags, exporter.as_ref())
                            .await
                    }
                },
                progress,
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
    mapper: &BlockMapper,
    flags: BlockGroupFlags,
    exporter: &dyn ItemExporter,
) -> Result<u64, WorkError> {
    let calls = requests::block_with_consensus_info_by_number(batch.iter().copied());
    let results = provider.make_batch_request(&calls).await.map_err(work_error)?;

    let mut exported = 0u64;
    for result in results {
        let payload: BlockPayload = serde_json::from_value(result).map_err(fatal)?;
        let block = mapper.map(&payload).map_err(fatal)?;
        exported += export_block(block, flags, exporter)?;
    }
    Ok(exported)
}

/// Emits one block's records in deterministic order: the block, its
/// transactions, then each receipt followed by its logs and their
/// extracted transfers.
fn export_block(
    mut block: Block,
    flags: BlockGroupFlags,
    exporter: &dyn ItemExporter,
) -> Result<u64, WorkError> {
    let mut exported = 0u64;
    let mut emit = |record: ExportRecord| -> Result<(), WorkError> {
        exporter.export_item(&record).map_err(fatal)?;
        exported += 1;
        Ok(())
    };

    let transactions = std::mem::take(&mut block.transactions);
    let receipts = std::mem::take(&mut block.receipts);

    if flags.blocks {
        emit(ExportRecord::Block(block))?;
    }

    if flags.transactions {
        for transaction in transactions {
            emit(ExportRecord::Transaction(transaction))?;
        }
    }

    if flags.require_receipts() {
        for receipt in receipts {
            let logs = receipt.logs.clone();
            if flags.receipts {
                emit(ExportRecord::Receipt(receipt))?;
            }
            if flags.require_logs() {
                for log in logs {
                    let transfers =
                        flags.token_transfers.then(|| extract_transfers_from_log(&log));
                    if flags.logs {
                        emit(ExportRecord::Log(log))?;
                    }
                    for transfer in transfers.into_iter().flatten() {
                        emit(ExportRecord::TokenTransfer(transfer))?;
                    }
                }
            }
        }
    }

    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use klay_export::test_utils::CollectingExporter;
    use klay_rpc::test_utils::MockBatchProvider;
    use serde_json::{json, Value};

    struct MockSource(Arc<MockBatchProvider>);

    impl ProviderSource for MockSource {
        fn provider(&self) -> Result<Arc<dyn BatchProvider>, RpcErrorKind> {
            Ok(Arc::clone(&self.0) as Arc<dyn BatchProvider>)
        }
    }

    fn empty_block(number: u64) -> Value {
        json!({
            "number": format!("0x{number:x}"),
            "hash": format!("0x{number:064x}"),
            "parentHash": format!("0x{:064x}", number.wrapping_sub(1)),
            "logsBloom": "0x0",
            "transactionsRoot": format!("0x{:064x}", 1),
            "stateRoot": format!("0x{:064x}", 2),
            "receiptsRoot": format!("0x{:064x}", 3),
            "size": "0x2f2",
            "extraData": "0x",
            "gasUsed": "0x0",
            "timestamp": "0x5ddd2365",
            "timestampFoS": "0x0",
            "blockscore": "0x1",
            "totalBlockScore": "0x1",
            "governanceData": "0x",
            "voteData": "0x",
            "committee": ["0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0"],
            "proposer": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
            "reward": "0x2abe3e13f3e82beb9708705164e4cc726d9802c3",
            "transactions": [],
        })
    }

    fn block_with_transfer(number: u64) -> Value {
        let mut block = empty_block(number);
        block["transactions"] = json!([{
            "transactionHash": format!("0x{:064x}", 0xaa),
            "nonce": "0x1",
            "blockHash": format!("0x{number:064x}"),
            "blockNumber": format!("0x{number:x}"),
            "transactionIndex": "0x0",
            "from": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
            "to": "0xcee8faf64bb97a73bb51e115aa89c17ffa8dd167",
            "value": "0x0",
            "gas": "0x7a120",
            "gasPrice": "0x5d21dba00",
            "gasUsed": "0x5208",
            "input": "0x",
            "type": "TxTypeLegacyTransaction",
            "typeInt": 0,
            "status": "0x1",
            "logs": [{
                "logIndex": "0x0",
                "transactionHash": format!("0x{:064x}", 0xaa),
                "transactionIndex": "0x0",
                "blockHash": format!("0x{number:064x}"),
                "blockNumber": format!("0x{number:x}"),
                "address": "0xcee8faf64bb97a73bb51e115aa89c17ffa8dd167",
                "data": "0x000000000000000000000000000000000000000000000000000000000501cdf5",
                "topics": [
                    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                    "0x0000000000000000000000002bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                    "0x0000000000000000000000002abe3e13f3e82beb9708705164e4cc726d9802c3"
                ],
                "removed": false,
            }],
        }]);
        block
    }

    fn job_over(
        provider: MockBatchProvider,
        start: u64,
        end: u64,
        exporter: Arc<CollectingExporter>,
    ) -> ExportBlockGroupJob {
        ExportBlockGroupJob::new(
            start,
            end,
            2,
            2,
            Arc::new(MockSource(Arc::new(provider))),
            exporter,
            true,
            BlockGroupFlags::ALL,
            10,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_block_emits_exactly_one_record() {
        let provider = MockBatchProvider::new(|call| Ok(empty_block(call.id)));
        let exporter = Arc::new(CollectingExporter::new());
        job_over(provider, 1, 1, Arc::clone(&exporter)).run().await.unwrap();

        let records = exporter.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind(), "block");
    }

    #[tokio::test]
    async fn log_emitting_block_derives_the_whole_group() {
        let provider = MockBatchProvider::new(|call| Ok(block_with_transfer(call.id)));
        let exporter = Arc::new(CollectingExporter::new());
        job_over(provider, 95978055, 95978055, Arc::clone(&exporter)).run().await.unwrap();

        assert_eq!(exporter.records_of("block").len(), 1);
        assert_eq!(exporter.records_of("transaction").len(), 1);
        assert_eq!(exporter.records_of("receipt").len(), 1);
        assert_eq!(exporter.records_of("log").len(), 1);
        assert_eq!(exporter.records_of("token_transfer").len(), 1);
    }

    #[tokio::test]
    async fn at_least_one_flag_is_required() {
        let provider = MockBatchProvider::new(|call| Ok(empty_block(call.id)));
        let flags = BlockGroupFlags {
            blocks: false,
            transactions: false,
            receipts: false,
            logs: false,
            token_transfers: false,
        };
        let result = ExportBlockGroupJob::new(
            1,
            1,
            1,
            1,
            Arc::new(MockSource(Arc::new(provider))),
            Arc::new(CollectingExporter::new()),
            false,
            flags,
            10,
        );
        assert!(matches!(result, Err(JobError::InvalidOptions(_))));
    }
}
