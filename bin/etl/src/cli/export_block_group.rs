//! The `export-block-group` subcommand.

use super::{OutputArgs, ProviderArgs};
use klay_export::{fields, item_exporter};
use klay_jobs::{BlockGroupFlags, ExportBlockGroupJob, JobError};
use std::{path::PathBuf, sync::Arc};

/// Arguments of `export-block-group`.
#[derive(Debug, clap::Args)]
pub(crate) struct ExportBlockGroupArgs {
    /// Start block, inclusive.
    #[arg(long, short = 's', default_value_t = 0)]
    start_block: u64,
    /// End block, inclusive.
    #[arg(long, short = 'e')]
    end_block: u64,
    /// The number of blocks to process at a time.
    #[arg(long, short = 'b', default_value_t = 100)]
    batch_size: usize,
    /// The number of parallel workers.
    #[arg(long, short = 'w', default_value_t = 5)]
    max_workers: usize,
    /// Output for blocks; omitted types are not exported.
    #[arg(long)]
    blocks_output: Option<PathBuf>,
    /// Output for transactions.
    #[arg(long)]
    transactions_output: Option<PathBuf>,
    /// Output for receipts.
    #[arg(long)]
    receipts_output: Option<PathBuf>,
    /// Output for logs.
    #[arg(long)]
    logs_output: Option<PathBuf>,
    /// Output for token transfers.
    #[arg(long)]
    token_transfers_output: Option<PathBuf>,
    /// Enrich records with block and receipt context.
    #[arg(long)]
    enrich: bool,
    /// How often to log progress, in percent.
    #[arg(long, default_value_t = 10)]
    log_percentage_step: u64,
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(flatten)]
    output: OutputArgs,
}

impl ExportBlockGroupArgs {
    pub(crate) async fn run(self) -> Result<(), JobError> {
        let flags = BlockGroupFlags {
            blocks: self.blocks_output.is_some(),
            transactions: self.transactions_output.is_some(),
            receipts: self.receipts_output.is_some(),
            logs: self.logs_output.is_some(),
            token_transfers: self.token_transfers_output.is_some(),
        };
        let sinks = fields::block_group_sinks(
            self.blocks_output,
            self.transactions_output,
            self.receipts_output,
            self.logs_output,
            self.token_transfers_output,
            self.enrich,
        );
        let exporter = item_exporter(sinks, &self.output.exporter_options()?);

        let job = ExportBlockGroupJob::new(
            self.start_block,
            self.end_block,
            self.batch_size,
            self.max_workers,
            Arc::new(self.provider.factory()?),
            Arc::from(exporter),
            self.enrich,
            flags,
            self.log_percentage_step,
        )?;
        job.run().await
    }
}
