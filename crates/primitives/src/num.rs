//! Serde adapters for [U256] quantities.
//!
//! Downstream warehouses take the monetary columns as arbitrary-precision
//! decimals, so [U256] fields serialize as base-10 strings rather than the
//! 0x-prefixed hex alloy defaults to.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serializer};

/// Serializes a [U256] as a decimal string.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserializes a [U256] from a decimal string.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse::<U256>().map_err(serde::de::Error::custom)
}

/// Serde adapter for optional [U256] fields.
pub mod opt {
    use super::*;

    /// Serializes an optional [U256] as a decimal string or null.
    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional decimal string.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|raw| raw.parse::<U256>().map_err(serde::de::Error::custom)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Wrapper {
        #[serde(with = "crate::num")]
        value: U256,
        #[serde(with = "crate::num::opt")]
        base_fee: Option<U256>,
    }

    #[test]
    fn quantities_render_as_decimal_strings() {
        let wrapper = Wrapper {
            value: U256::from(84_004_341u64),
            base_fee: None,
        };
        let json = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(json["value"], "84004341");
        assert!(json["base_fee"].is_null());
    }
}
