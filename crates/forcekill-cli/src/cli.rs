use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forcekill_core::PointerWidth;

#[derive(Parser)]
#[command(name = "forcekill")]
#[command(about = "Offline tooling for the kernel terminate-routine resolver")]
#[command(version)]
pub struct Cli {
    /// JSON config file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the signature table
    Signatures {
        /// Signature file to use instead of the configured one
        #[arg(short, long)]
        signatures: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a memory dump for a byte pattern
    Scan {
        /// Raw memory dump
        #[arg(short, long)]
        file: PathBuf,

        /// Address the dump was taken from
        #[arg(short, long, default_value = "0")]
        base: String,

        /// Hex bytes, e.g. "E8" or "48 8B 05"
        #[arg(short, long)]
        pattern: String,

        /// First address to scan (defaults to the start of the dump)
        #[arg(long)]
        start: Option<String>,

        /// Bytes to scan, decimal or 0x-prefixed hex (defaults to the rest of the dump)
        #[arg(long)]
        len: Option<String>,

        /// Pointer width used to decode rel32 targets after each match
        #[arg(long, default_value = "64")]
        width: PointerWidth,

        /// Maximum matches to print
        #[arg(long, default_value_t = 32)]
        limit: usize,
    },

    /// Resolve the terminate routine from a dump of the anchor routine
    Resolve {
        /// Raw memory dump covering the anchor and its scan window
        #[arg(short, long)]
        file: PathBuf,

        /// Address the dump was taken from
        #[arg(short, long)]
        base: String,

        /// Anchor routine address (defaults to the dump base)
        #[arg(short, long)]
        anchor: Option<String>,

        /// OS major version
        #[arg(long)]
        major: u32,

        /// OS minor version
        #[arg(long)]
        minor: u32,

        /// Pointer width of the dumped kernel
        #[arg(long, default_value = "64")]
        width: PointerWidth,

        /// Scan window size, decimal or 0x-prefixed hex (overrides config)
        #[arg(long)]
        window: Option<String>,

        /// Signature file to use instead of the configured one
        #[arg(short, long)]
        signatures: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display bytes of a memory dump
    Hexdump {
        /// Raw memory dump
        #[arg(short, long)]
        file: PathBuf,

        /// Address the dump was taken from
        #[arg(short, long, default_value = "0")]
        base: String,

        /// First address to display (defaults to the dump base)
        #[arg(short, long)]
        address: Option<String>,

        /// Number of bytes
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Show ASCII column
        #[arg(long)]
        ascii: bool,
    },

    /// Print the effective configuration, or write it to a file
    Config {
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
