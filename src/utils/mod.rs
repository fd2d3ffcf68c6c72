pub mod sha256;

use primitive_types::U256;

use crate::error::{Error, Result};

/// Parses up to 64 hex digits (optionally `0x`-prefixed, odd length allowed) into a `U256`.
pub(crate) fn parse_hex_u256(text: &str) -> Result<U256> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 64 {
        return Err(Error::Encoding(format!(
            "expected 1 to 64 hex digits, got {}",
            digits.len()
        )));
    }
    let bytes = hex::decode(format!("{digits:0>64}"))?;
    Ok(U256::from_big_endian(&bytes))
}
