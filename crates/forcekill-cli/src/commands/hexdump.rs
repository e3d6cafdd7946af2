//! Hexdump command implementation.
//!
//! Displays bytes of a memory dump in traditional hexdump format, addressed by
//! where they lived in the dumped address space.
//!
//! # Output Format
//!
//! ```text
//! 0xFFFFF80002A0C4B0: 48 89 5C 24 08 57 48 83  EC 20 8B FA E8 4F 1D 00  |H.\$.WH.. ...O..|
//! ```

use std::path::Path;

use anyhow::Result;
use forcekill_core::{MemoryImage, ReadMemory};

use super::hex_utils::{parse_hex_address, parse_hex_or};

/// Run the hexdump command
pub fn run(file: &Path, base: &str, address: Option<&str>, size: usize, ascii: bool) -> Result<()> {
    let base = parse_hex_address(base)?;
    let image = MemoryImage::from_file(file, base)?;
    let address = parse_hex_or(address, base)?;

    let size = size.min(image.end().saturating_sub(address) as usize);
    let bytes = image.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();

    for (i, chunk) in bytes.chunks(16).enumerate() {
        println!("{}", format_line(address + (i * 16) as u64, chunk, ascii));
    }

    Ok(())
}

/// Format one line of up to 16 bytes
pub fn format_line(address: u64, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:X}: ", address);

    // Hex bytes
    for (j, byte) in chunk.iter().enumerate() {
        if j == 8 {
            line.push(' ');
        }
        line.push_str(&format!("{:02X} ", byte));
    }

    // Padding for incomplete lines
    for j in chunk.len()..16 {
        if j == 8 {
            line.push(' ');
        }
        line.push_str("   ");
    }

    if ascii {
        line.push_str(" |");
        for byte in chunk {
            if (0x20..0x7F).contains(byte) {
                line.push(*byte as char);
            } else {
                line.push('.');
            }
        }
        for _ in chunk.len()..16 {
            line.push(' ');
        }
        line.push('|');
    }

    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_full_line() {
        let chunk: Vec<u8> = (0x41..0x51).collect();
        assert_eq!(
            format_line(0x1000, &chunk, true),
            "0x1000: 41 42 43 44 45 46 47 48  49 4A 4B 4C 4D 4E 4F 50  |ABCDEFGHIJKLMNOP|"
        );
    }

    #[test]
    fn test_format_partial_line() {
        let line = format_line(0x20, &[0xE8, 0x00], true);
        assert!(line.starts_with("0x20: E8 00 "));
        assert!(line.ends_with("|..              |"));
    }

    #[test]
    fn test_run_rejects_base_near_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.bin");
        std::fs::write(&path, [0u8; 32]).unwrap();

        assert!(run(&path, "FFFFFFFFFFFFFFF0", None, 16, false).is_err());
        assert!(run(&path, "FFFFFFFFFFFFFFD0", Some("FFFFFFFFFFFFFFE0"), 64, true).is_ok());
    }

    #[test]
    fn test_format_without_ascii() {
        assert_eq!(format_line(0, &[0xCC; 3], false), "0x0: CC CC CC");
    }
}
