#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
pub use errors::ValidationError;

mod hex;
pub use hex::{
    hex_to_u256, hex_to_u64, parse_address, parse_hash, parse_opt_address, parse_opt_hash,
};

mod time;
pub use time::BlockTime;

mod batch;
pub use batch::validate_range;

pub mod num;
