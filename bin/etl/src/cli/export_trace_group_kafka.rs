//! The `export-trace-group-kafka` subcommand.

use super::{OutputArgs, ProviderArgs};
use klay_export::{fields, item_exporter};
use klay_jobs::{ExportTraceGroupKafkaJob, JobError, TraceGroupFlags};
use klay_rpc::ProviderSource;
use klay_segment::{KafkaSegmentSource, KafkaSourceConfig};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Arguments of `export-trace-group-kafka`.
#[derive(Debug, clap::Args)]
pub(crate) struct ExportTraceGroupKafkaArgs {
    /// Start block, inclusive.
    #[arg(long, short = 's', default_value_t = 0)]
    start_block: u64,
    /// End block, inclusive.
    #[arg(long, short = 'e')]
    end_block: u64,
    /// Kafka broker list.
    #[arg(long)]
    kafka_uri: String,
    /// Kafka consumer group id.
    #[arg(long)]
    kafka_group_id: String,
    /// The trace topic.
    #[arg(long)]
    kafka_topic: String,
    /// The partition to consume.
    #[arg(long, default_value_t = 0)]
    kafka_partition: i32,
    /// The offset to resume from.
    #[arg(long, default_value_t = 0)]
    kafka_offset: i64,
    /// Seconds an idle tail read waits before re-checking the range.
    #[arg(long, default_value_t = 60)]
    poll_timeout: u64,
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
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(flatten)]
    output: OutputArgs,
}

impl ExportTraceGroupKafkaArgs {
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

        let source = KafkaSegmentSource::connect(&KafkaSourceConfig {
            bootstrap_servers: self.kafka_uri,
            group_id: self.kafka_group_id,
            topic: self.kafka_topic,
            partition: self.kafka_partition,
            offset: self.kafka_offset,
            poll_timeout: Duration::from_secs(self.poll_timeout),
        })?;

        let job = ExportTraceGroupKafkaJob::new(
            self.start_block,
            self.end_block,
            source,
            self.provider.factory()?.provider()?,
            Arc::from(exporter),
            self.enrich,
            flags,
            self.kafka_partition,
            self.kafka_offset,
            self.log_percentage_step,
        )?;
        let outcome = job.run().await?;
        info!(
            target: "etl",
            partition = outcome.partition,
            offset = outcome.offset,
            "trace group export finished; resume from {}/{}",
            outcome.partition,
            outcome.offset
        );
        Ok(())
    }
}
