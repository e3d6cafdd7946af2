//! Hex address parsing and formatting utilities.

use anyhow::Result;

/// Parse a hex address string (with or without 0x prefix).
///
/// Underscores and WinDbg-style backticks are accepted as digit separators,
/// so kernel addresses can be pasted straight from a debugger session.
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    let digits: String = s.chars().filter(|c| *c != '_' && *c != '`').collect();
    u64::from_str_radix(&digits, 16)
        .map_err(|e| anyhow::anyhow!("Invalid hex address '{}': {}", s, e))
}

/// Parse an optional hex address, falling back to `default`
pub fn parse_hex_or(s: Option<&str>, default: u64) -> Result<u64> {
    s.map(parse_hex_address).transpose().map(|v| v.unwrap_or(default))
}

/// Parse a byte count: decimal, or hex with a 0x prefix
pub fn parse_count(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.starts_with("0x") || s.starts_with("0X") {
        parse_hex_address(s)
    } else {
        s.replace('_', "")
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("Invalid count '{}': {}", s, e))
    }
}

/// Parse an optional byte count, falling back to `default`
pub fn parse_count_or(s: Option<&str>, default: u64) -> Result<u64> {
    s.map(parse_count).transpose().map(|v| v.unwrap_or(default))
}

/// Format an address as a hex string with 0x prefix.
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}
