//! Parsing helpers for 0x-prefixed wire values.
//!
//! Klaytn JSON-RPC responses carry every numeric field as a 0x-prefixed hex
//! string. Missing fields map to `None`; malformed values are a
//! [ValidationError].

use crate::ValidationError;
use alloy_primitives::{Address, B256, U256};
use std::str::FromStr;

/// Parses an optional 0x-prefixed hex quantity into a `u64`.
///
/// `None` input yields `Ok(None)`; a present but malformed value is an
/// [ValidationError::InvalidHex].
pub fn hex_to_u64(value: Option<&str>) -> Result<Option<u64>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| ValidationError::InvalidHex(value.to_string()))
}

/// Parses an optional 0x-prefixed hex quantity into a [U256].
///
/// Used for the monetary fields where 64-bit overflow is the common case.
pub fn hex_to_u256(value: Option<&str>) -> Result<Option<U256>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let digits = value.strip_prefix("0x").unwrap_or(value);
    U256::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|_| ValidationError::InvalidHex(value.to_string()))
}

/// Parses a required 42-character address, normalizing to lowercase.
pub fn parse_address(value: Option<&str>) -> Result<Address, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField("address"))?;
    Address::from_str(value).map_err(|_| ValidationError::InvalidAddress(value.to_string()))
}

/// Parses an optional 42-character address.
///
/// `None`, the empty string, and the bare `0x` prefix all map to `None`;
/// `to` fields of contract creation transactions arrive as JSON null and
/// trace placeholders carry `0x`.
pub fn parse_opt_address(value: Option<&str>) -> Result<Option<Address>, ValidationError> {
    match value {
        None | Some("") | Some("0x") => Ok(None),
        Some(value) => parse_address(Some(value)).map(Some),
    }
}

/// Parses a required 66-character hash.
pub fn parse_hash(value: Option<&str>) -> Result<B256, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField("hash"))?;
    B256::from_str(value).map_err(|_| ValidationError::InvalidHash(value.to_string()))
}

/// Parses an optional 66-character hash.
pub fn parse_opt_hash(value: Option<&str>) -> Result<Option<B256>, ValidationError> {
    match value {
        None | Some("") => Ok(None),
        Some(value) => parse_hash(Some(value)).map(Some),
    }
}
