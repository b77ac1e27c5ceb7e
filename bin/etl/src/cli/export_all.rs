//! The `export-all` subcommand: every item type under one directory.

use super::{OutputArgs, ProviderArgs};
use klay_export::{fields, item_exporter, ExporterOptions};
use klay_jobs::{
    BlockGroupFlags, ExportBlockGroupJob, ExportTraceGroupJob, JobError, TraceGroupFlags,
};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

/// Arguments of `export-all`.
#[derive(Debug, clap::Args)]
pub(crate) struct ExportAllArgs {
    /// Start block, inclusive.
    #[arg(long, short = 's', default_value_t = 0)]
    start_block: u64,
    /// End block, inclusive.
    #[arg(long, short = 'e')]
    end_block: u64,
    /// Directory the per-type outputs land under.
    #[arg(long, short = 'o')]
    output_dir: PathBuf,
    /// The number of blocks to process at a time.
    #[arg(long, short = 'b', default_value_t = 100)]
    batch_size: usize,
    /// The number of parallel workers.
    #[arg(long, short = 'w', default_value_t = 5)]
    max_workers: usize,
    /// How often to log progress, in percent.
    #[arg(long, default_value_t = 10)]
    log_percentage_step: u64,
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(flatten)]
    output: OutputArgs,
}

impl ExportAllArgs {
    pub(crate) async fn run(self) -> Result<(), JobError> {
        // rotation keeps warehouse loads bounded even when the caller gave
        // no explicit maxlines
        let mut options: ExporterOptions = self.output.exporter_options()?;
        if options.file_maxlines.is_none() {
            options.file_maxlines = Some(10_000);
        }
        let type_dir = |kind: &str| Some(self.output_dir.join(kind));

        let block_group_sinks = fields::block_group_sinks(
            type_dir("blocks"),
            type_dir("transactions"),
            type_dir("receipts"),
            type_dir("logs"),
            type_dir("token_transfers"),
            true,
        );
        let block_job = ExportBlockGroupJob::new(
            self.start_block,
            self.end_block,
            self.batch_size,
            self.max_workers,
            Arc::new(self.provider.factory()?),
            Arc::from(item_exporter(block_group_sinks, &options)),
            true,
            BlockGroupFlags::ALL,
            self.log_percentage_step,
        )?;
        block_job.run().await?;
        info!(target: "etl", "block group export finished");

        let trace_group_sinks = fields::trace_group_sinks(
            type_dir("traces"),
            type_dir("contracts"),
            type_dir("tokens"),
            true,
        );
        let trace_job = ExportTraceGroupJob::new(
            self.start_block,
            self.end_block,
            self.batch_size,
            self.max_workers,
            Arc::new(self.provider.factory()?),
            Arc::from(item_exporter(trace_group_sinks, &options)),
            true,
            TraceGroupFlags::ALL,
            self.log_percentage_step,
            false,
        )?;
        trace_job.run().await?;
        info!(target: "etl", "trace group export finished");

        Ok(())
    }
}
