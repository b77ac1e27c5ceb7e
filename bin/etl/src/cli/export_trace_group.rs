//! The `export-trace-group` subcommand (RPC variant).

use super::{OutputArgs, ProviderArgs};
use klay_export::{fields, item_exporter};
use klay_jobs::{ExportTraceGroupJob, JobError, TraceGroupFlags};
use std::{path::PathBuf, sync::Arc};

/// Arguments of `export-trace-group`.
#[derive(Debug, clap::Args)]
pub(crate) struct ExportTraceGroupArgs {
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
    /// Output for traces; omitted types are not exported.
    #[arg(long)]
    traces_output: Option<PathBuf>,
    /// Output for contracts.
    #[arg(long)]
    contracts_output: Option<PathBuf>,
    /// Output for tokens.
    #[arg(long)]
    tokens_output: Option<PathBuf>,
    /// Enrich records with block and transaction context.
    #[arg(long)]
    enrich: bool,
    /// How often to log progress, in percent.
    #[arg(long, default_value_t = 10)]
    log_percentage_step: u64,
    /// Log the trace count of every finished batch.
    #[arg(long)]
    detailed_trace_log: bool,
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(flatten)]
    output: OutputArgs,
}

impl ExportTraceGroupArgs {
    pub(crate) async fn run(self) -> Result<(), JobError> {
        let flags = TraceGroupFlags {
            traces: self.traces_output.is_some(),
            contracts: self.contracts_output.is_some(),
            tokens: self.tokens_output.is_some(),
        };
        let sinks = fields::trace_group_sinks(
            self.traces_output,
            self.contracts_output,
            self.tokens_output,
            self.enrich,
        );
        let exporter = item_exporter(sinks, &self.output.exporter_options()?);

        let job = ExportTraceGroupJob::new(
            self.start_block,
            self.end_block,
            self.batch_size,
            self.max_workers,
            Arc::new(self.provider.factory()?),
            Arc::from(exporter),
            self.enrich,
            flags,
            self.log_percentage_step,
            self.detailed_trace_log,
        )?;
        job.run().await
    }
}
