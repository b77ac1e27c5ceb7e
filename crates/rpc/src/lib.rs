#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
pub use errors::{RpcError, RpcErrorKind};

mod client;
pub use client::{BatchProvider, BatchRpcClient, ProviderFactory, ProviderSource, RpcCall};

pub mod requests;

mod contract;
pub use contract::{
    function_sighashes, selector, ContractClassifier, ERC1155_INTERFACE_ID, ERC20_INTERFACE_ID,
    ERC721_INTERFACE_ID,
};

mod token;
pub use token::{TokenMetadata, TokenMetadataService};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
