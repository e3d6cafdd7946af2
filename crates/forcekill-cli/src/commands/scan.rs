//! Scan command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use forcekill_core::{
    MemoryImage, MemoryRange, MemoryScanner, PointerWidth, ReadMemory, decode_relative_target,
    parse_pattern,
};

use super::hex_utils::{parse_count_or, parse_hex_address, parse_hex_or};

/// One pattern match in a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanHit {
    pub address: u64,
    /// Where a rel32 operand right after the match would point
    pub rel32_target: Option<u64>,
}

/// Run the scan command
pub fn run(
    file: &Path,
    base: &str,
    pattern: &str,
    start: Option<&str>,
    len: Option<&str>,
    width: PointerWidth,
    limit: usize,
) -> Result<()> {
    let base = parse_hex_address(base)?;
    let image = MemoryImage::from_file(file, base)?;
    let bytes = parse_pattern(pattern)?;

    let start = parse_hex_or(start, image.base())?;
    if start < image.base() || start > image.end() {
        bail!(
            "Start 0x{:X} is outside the dump (0x{:X}..0x{:X})",
            start,
            image.base(),
            image.end()
        );
    }
    let len = parse_count_or(len, image.end() - start)?.min(image.end() - start);
    let range = MemoryRange::with_len(start, len);

    println!("Searching for pattern: {} ({} bytes)", pattern, bytes.len());
    println!("Search range: {}", range);
    println!();

    let hits = find_hits(&image, &range, &bytes, width)?;
    for hit in hits.iter().take(limit) {
        match hit.rel32_target {
            Some(target) => println!(
                "  0x{:X} (+0x{:X})  rel32 -> 0x{:X}",
                hit.address,
                hit.address - image.base(),
                target
            ),
            None => println!("  0x{:X} (+0x{:X})", hit.address, hit.address - image.base()),
        }
    }

    println!();
    if hits.len() > limit {
        println!("Found {} matches (showing first {})", hits.len(), limit);
    } else {
        println!("Found {} matches", hits.len());
    }

    Ok(())
}

/// All matches of `pattern` in `range`, with the rel32 operand that follows each decoded
pub fn find_hits(
    image: &MemoryImage,
    range: &MemoryRange,
    pattern: &[u8],
    width: PointerWidth,
) -> Result<Vec<ScanHit>> {
    let scanner = MemoryScanner::new(image);
    let hits = scanner
        .find_all(range, pattern)?
        .into_iter()
        .map(|address| {
            let operand = address + pattern.len() as u64;
            let rel32_target = image
                .read_i32(operand)
                .ok()
                .map(|disp| decode_relative_target(operand, disp, width));
            ScanHit {
                address,
                rel32_target,
            }
        })
        .collect();
    Ok(hits)
}
