//! Config command implementation.

use std::path::Path;

use anyhow::Result;
use forcekill_core::Config;
use tracing::info;

/// Run the config command
pub fn run(config: &Config, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            info!("Config written to {:?}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
