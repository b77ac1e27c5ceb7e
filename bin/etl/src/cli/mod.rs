//! CLI argument surface.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use klay_export::{ExporterOptions, FileFormat};
use klay_jobs::JobError;
use klay_rpc::ProviderFactory;
use std::time::Duration;
use url::Url;

mod export_all;
mod export_block_group;
mod export_trace_group;
mod export_trace_group_kafka;

/// Klaytn chain data extraction.
#[derive(Debug, Parser)]
#[command(name = "klay-etl", version, about)]
pub(crate) struct Cli {
    /// Verbosity level (0-2).
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub v: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export blocks, transactions, receipts, logs, and token transfers.
    ExportBlockGroup(export_block_group::ExportBlockGroupArgs),
    /// Export traces, contracts, and tokens via debug_traceBlockByNumber.
    ExportTraceGroup(export_trace_group::ExportTraceGroupArgs),
    /// Export traces, contracts, and tokens from the trace Kafka topic.
    ExportTraceGroupKafka(export_trace_group_kafka::ExportTraceGroupKafkaArgs),
    /// Export every item type under one output directory.
    ExportAll(export_all::ExportAllArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), JobError> {
        match self.command {
            Commands::ExportBlockGroup(args) => args.run().await,
            Commands::ExportTraceGroup(args) => args.run().await,
            Commands::ExportTraceGroupKafka(args) => args.run().await,
            Commands::ExportAll(args) => args.run().await,
        }
    }
}

/// Predefined public archive endpoints.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum Network {
    /// The Klaytn testnet.
    Baobab,
    /// The Klaytn mainnet.
    Cypress,
}

impl Network {
    const fn provider_uri(self) -> &'static str {
        match self {
            Self::Baobab => "https://baobab.fandom.finance/archive",
            Self::Cypress => "https://cypress.fandom.finance/archive",
        }
    }
}

/// Provider options shared by every export command.
#[derive(Debug, clap::Args)]
pub(crate) struct ProviderArgs {
    /// The URI of the JSON-RPC endpoint (archive, consensus-info capable).
    #[arg(
        long,
        short = 'p',
        default_value = "https://cypress.fandom.finance/archive"
    )]
    provider_uri: String,
    /// Use a predefined public endpoint instead of --provider-uri.
    #[arg(long)]
    network: Option<Network>,
    /// Per-request connection timeout in seconds.
    #[arg(long, short = 't', default_value_t = 60)]
    timeout: u64,
}

impl ProviderArgs {
    pub(crate) fn factory(&self) -> Result<ProviderFactory, JobError> {
        let uri = match self.network {
            Some(network) => network.provider_uri(),
            None => self.provider_uri.as_str(),
        };
        let endpoint = Url::parse(uri)
            .map_err(|err| JobError::InvalidOptions(format!("bad provider uri {uri:?}: {err}")))?;
        Ok(ProviderFactory::new(endpoint, Duration::from_secs(self.timeout)))
    }
}

/// Output encoding options shared by every export command.
#[derive(Debug, clap::Args)]
pub(crate) struct OutputArgs {
    /// Export file format.
    #[arg(long, default_value = "json")]
    file_format: String,
    /// Max rows per output file; omit for a single file per type.
    #[arg(long)]
    file_maxlines: Option<i64>,
    /// Gzip the output files.
    #[arg(long)]
    compress: bool,
}

impl OutputArgs {
    pub(crate) fn exporter_options(&self) -> Result<ExporterOptions, JobError> {
        let format: FileFormat =
            self.file_format.parse().map_err(JobError::InvalidOptions)?;
        // non-positive maxlines means the single-file backend
        let file_maxlines =
            self.file_maxlines.and_then(|maxlines| u64::try_from(maxlines).ok()).filter(|m| *m > 0);
        Ok(ExporterOptions { format, file_maxlines, compress: self.compress })
    }
}
