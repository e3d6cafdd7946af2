//! Resolve command implementation.
//!
//! Replays resolution against a dump of the anchor routine, with the OS
//! version supplied on the command line instead of queried from a kernel.

use std::path::PathBuf;

use anyhow::{Context, Result};
use forcekill_core::{
    Config, HostVersion, MemoryImage, PointerWidth, Resolution, RoutineResolver, SymbolResolver,
    load_signatures,
};
use owo_colors::OwoColorize;

use super::hex_utils::{format_hex_address, parse_count_or, parse_hex_address, parse_hex_or};

pub struct ResolveArgs {
    pub file: PathBuf,
    pub base: String,
    pub anchor: Option<String>,
    pub major: u32,
    pub minor: u32,
    pub width: PointerWidth,
    pub window: Option<String>,
    pub signatures: Option<PathBuf>,
    pub json: bool,
}

/// Stands in for the kernel when resolving from a dump
struct OfflineHost {
    major: u32,
    minor: u32,
    width: PointerWidth,
    anchor_symbol: String,
    anchor: u64,
}

impl HostVersion for OfflineHost {
    fn os_version(&self) -> (u32, u32) {
        (self.major, self.minor)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.width
    }
}

impl SymbolResolver for OfflineHost {
    fn export_address(&self, name: &str) -> Option<u64> {
        (name == self.anchor_symbol).then_some(self.anchor)
    }
}

/// Run the resolve command
pub fn run(config: &Config, args: ResolveArgs) -> Result<()> {
    let resolution = resolve_dump(config, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&resolution))?);
        return Ok(());
    }

    println!("Version:      {}", resolution.key);
    println!("Signature:    {}", resolution.signature);
    println!("Anchor:       {}", format_hex_address(resolution.anchor));
    println!("Window:       {}", resolution.window);
    println!(
        "Match:        {} (anchor+0x{:X})",
        format_hex_address(resolution.operand - resolution.signature.len() as u64),
        resolution.operand - resolution.signature.len() as u64 - resolution.anchor
    );
    println!("Displacement: {}", resolution.displacement);
    println!("Routine:      {}", resolution.routine.green());
    Ok(())
}

fn resolve_dump(config: &Config, args: &ResolveArgs) -> Result<Resolution> {
    let base = parse_hex_address(&args.base)?;
    let image = MemoryImage::from_file(&args.file, base)?;

    let table = match &args.signatures {
        Some(path) => load_signatures(path)?,
        None => config.signature_table()?,
    };

    let mut resolver_config = config.resolver.clone();
    resolver_config.scan_window =
        parse_count_or(args.window.as_deref(), resolver_config.scan_window)?;

    let host = OfflineHost {
        major: args.major,
        minor: args.minor,
        width: args.width,
        anchor_symbol: resolver_config.anchor_symbol.clone(),
        anchor: parse_hex_or(args.anchor.as_deref(), base)?,
    };

    RoutineResolver::new(&host, &image, &table)
        .with_config(resolver_config)
        .resolve_detailed()
        .with_context(|| format!("Resolution failed for {:?}", args.file))
}

fn to_json(resolution: &Resolution) -> serde_json::Value {
    serde_json::json!({
        "version": resolution.key,
        "signature": resolution.signature,
        "anchor": format_hex_address(resolution.anchor),
        "window": {
            "start": format_hex_address(resolution.window.start()),
            "end": format_hex_address(resolution.window.end()),
        },
        "operand": format_hex_address(resolution.operand),
        "displacement": resolution.displacement,
        "routine": format_hex_address(resolution.routine.address()),
    })
}
