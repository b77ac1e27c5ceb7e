//! Derivation shared by both trace-group variants: walk the trace trees,
//! then synthesize contract and token records from creation traces.

use crate::errors::{fatal, work_error};
use klay_domain::{walk_trace_block, Contract, ExportRecord, Token, TraceBlock};
use klay_executor::WorkError;
use klay_export::ItemExporter;
use klay_primitives::ValidationError;
use klay_rpc::{function_sighashes, BatchProvider, ContractClassifier, TokenMetadataService};
use tracing::debug;

/// Which item types the trace-group jobs emit.
#[derive(Clone, Copy, Debug)]
pub struct TraceGroupFlags {
    /// Emit trace records.
    pub traces: bool,
    /// Emit contract records.
    pub contracts: bool,
    /// Emit token records.
    pub tokens: bool,
}

impl TraceGroupFlags {
    /// Everything on.
    pub const ALL: Self = Self { traces: true, contracts: true, tokens: true };

    pub(crate) const fn any(&self) -> bool {
        self.traces || self.contracts || self.tokens
    }

    /// Contracts must be classified to derive contracts or tokens.
    pub(crate) const fn require_contracts(&self) -> bool {
        self.contracts || self.tokens
    }
}

/// Walks one correlated trace block and exports its records. Returns the
/// number of traces walked.
pub(crate) async fn derive_trace_block(
    trace_block: &TraceBlock,
    enrich: bool,
    flags: TraceGroupFlags,
    provider: &dyn BatchProvider,
    exporter: &dyn ItemExporter,
) -> Result<u64, WorkError> {
    let traces = walk_trace_block(trace_block, enrich).map_err(fatal)?;
    let trace_count = traces.len() as u64;
    let classifier = ContractClassifier::new(provider);
    let token_service = TokenMetadataService::new(provider);

    for trace in traces {
        let creation = flags.require_contracts() && trace.is_contract_creation();

        let contract = if creation {
            let address = trace.to_address.ok_or(ValidationError::MissingCreationTarget).map_err(fatal)?;
            let sighashes = function_sighashes(trace.output.as_deref());
            let block_number = trace.block_number;
            let enrichment =
                enrich.then(|| Contract::enrichment_from_trace(&trace)).transpose().map_err(fatal)?;
            let contract = Contract {
                address,
                bytecode: trace.output.clone(),
                is_erc20: classifier
                    .is_erc20(address, &sighashes, Some(block_number))
                    .await
                    .map_err(work_error)?,
                is_erc721: classifier
                    .is_erc721(address, &sighashes, Some(block_number))
                    .await
                    .map_err(work_error)?,
                is_erc1155: classifier
                    .is_erc1155(address, &sighashes, Some(block_number))
                    .await
                    .map_err(work_error)?,
                function_sighashes: sighashes,
                block_number,
                enrichment,
            };
            Some(contract)
        } else {
            None
        };

        if flags.traces {
            exporter.export_item(&ExportRecord::Trace(trace)).map_err(fatal)?;
        }

        let Some(contract) = contract else {
            continue;
        };
        let is_token = contract.is_token();
        let address = contract.address;

        if flags.contracts {
            exporter.export_item(&ExportRecord::Contract(contract.clone())).map_err(fatal)?;
        }

        if flags.tokens && is_token {
            let metadata = token_service.token_metadata(address).await.map_err(work_error)?;
            debug!(target: "trace_group", %address, "classified token contract");
            let token = Token::from_contract(
                &contract,
                metadata.symbol,
                metadata.name,
                metadata.decimals,
                metadata.total_supply,
            );
            exporter.export_item(&ExportRecord::Token(token)).map_err(fatal)?;
        }
    }

    Ok(trace_count)
}
