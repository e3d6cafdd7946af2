//! Hex text form of signatures ("E8", "48 8B 05")

use crate::error::{Error, Result};

/// Parse a space-separated hex byte pattern.
///
/// Matching is byte-for-byte, so wildcard tokens (`??`) are rejected.
pub fn parse_pattern(pattern: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            return Err(Error::InvalidPattern(format!(
                "Wildcard '{}' is not supported in '{}'",
                token, pattern
            )));
        }

        let token = token.trim_start_matches("0x").trim_start_matches("0X");
        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(value);
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
