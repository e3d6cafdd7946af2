//! Signatures command implementation.

use std::path::Path;

use anyhow::Result;
use forcekill_core::{Config, SignatureTable, load_signatures};
#[cfg(any(test, target_os = "windows"))]
use forcekill_core::OsVersionKey;
#[cfg(any(test, target_os = "windows"))]
use owo_colors::OwoColorize;

/// Run the signatures command
pub fn run(config: &Config, signatures: Option<&Path>, json: bool) -> Result<()> {
    let table = match signatures {
        Some(path) => load_signatures(path)?,
        None => config.signature_table()?,
    };

    if json {
        let set = table.to_set(forcekill_core::signature::BUILTIN_TABLE_VERSION);
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    println!("{:<8} {:<8} {:<8} Pattern", "Major", "Minor", "Width");
    for line in table_lines(&table) {
        println!("{}", line);
    }

    print_host_status(&table);
    Ok(())
}

fn table_lines(table: &SignatureTable) -> Vec<String> {
    table
        .iter()
        .map(|(key, signature)| {
            let pattern = match signature {
                Some(sig) => sig.to_string(),
                None => "(unsupported)".to_string(),
            };
            format!(
                "{:<8} {:<8} {:<8} {}",
                key.major,
                key.minor,
                format!("{}-bit", key.width),
                pattern
            )
        })
        .collect()
}

#[cfg(any(test, target_os = "windows"))]
fn describe_host(table: &SignatureTable, key: &OsVersionKey) -> String {
    match table.lookup(key) {
        Some(sig) => format!("{} -> {}", key, sig.green()),
        None if table.is_known_gap(key) => {
            format!("{} -> {}", key, "known gap, unsupported".yellow())
        }
        None => format!("{} -> {}", key, "unsupported".red()),
    }
}

#[cfg(target_os = "windows")]
fn print_host_status(table: &SignatureTable) {
    use forcekill_core::host::windows::WindowsVersion;

    println!();
    match WindowsVersion::detect() {
        Ok(version) => {
            let key = OsVersionKey::detect(&version);
            println!("This host: {} (build {})", describe_host(table, &key), version.build);
        }
        Err(e) => println!("This host: {}", e.red()),
    }
}

#[cfg(not(target_os = "windows"))]
fn print_host_status(_table: &SignatureTable) {}

#[cfg(test)]
mod tests {
    use super::*;
    use forcekill_core::PointerWidth;

    #[test]
    fn test_table_lines_mark_gaps() {
        let lines = table_lines(&SignatureTable::builtin());
        assert_eq!(lines.len(), 10);
        assert!(lines[0].starts_with("6        0        32-bit"));
        assert!(lines[0].ends_with("(unsupported)"));
        assert!(lines.iter().any(|l| l.starts_with("10") && l.ends_with("E9")));
    }

    #[test]
    fn test_describe_host() {
        let table = SignatureTable::builtin();
        let supported = describe_host(&table, &OsVersionKey::new(6, 1, PointerWidth::Bits64));
        assert!(supported.contains("E8"));

        let gap = describe_host(&table, &OsVersionKey::new(6, 0, PointerWidth::Bits64));
        assert!(gap.contains("known gap"));
    }
}
