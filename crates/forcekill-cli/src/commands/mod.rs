//! CLI command implementations.
//!
//! Every command works on captured memory dumps; nothing here touches a live
//! kernel.

pub mod config;
pub mod hex_utils;
pub mod hexdump;
pub mod resolve;
pub mod scan;
pub mod signatures;
