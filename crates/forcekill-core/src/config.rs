//! Runtime configuration
//!
//! All empirical constants live here with their defaults; a JSON file can
//! override any subset of them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::signature::{SignatureTable, load_signatures};

/// Exported routine the scan window starts at
pub const DEFAULT_ANCHOR_SYMBOL: &str = "PsTerminateSystemThread";

/// Bytes scanned after the anchor.
///
/// Large enough to reach the call/jump into the terminate routine on every
/// build in the signature table. Not guaranteed for unknown builds.
pub const DEFAULT_SCAN_WINDOW: u64 = 0xFF;

/// Thread identifier sweep bounds.
///
/// Identifiers come out of a handle table, so they are multiples of 4 and stay
/// well below 0x80000 on the builds examined.
pub mod sweep {
    pub const FIRST_ID: u32 = 4;
    pub const END_ID: u32 = 0x80000;
    pub const STEP: u32 = 4;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub anchor_symbol: String,
    pub scan_window: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            anchor_symbol: DEFAULT_ANCHOR_SYMBOL.to_string(),
            scan_window: DEFAULT_SCAN_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub first_id: u32,
    /// Exclusive upper bound
    pub end_id: u32,
    pub step: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            first_id: sweep::FIRST_ID,
            end_id: sweep::END_ID,
            step: sweep::STEP,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::InvalidConfig("sweep step must be non-zero".to_string()));
        }
        if self.end_id <= self.first_id {
            return Err(Error::InvalidConfig(format!(
                "empty sweep range {}..{}",
                self.first_id, self.end_id
            )));
        }
        Ok(())
    }

    /// Identifiers the sweep will try, in order
    pub fn ids(&self) -> impl Iterator<Item = u32> {
        (self.first_id..self.end_id).step_by(self.step.max(1) as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub sweep: SweepConfig,
    /// Signature file replacing the built-in table
    pub signatures: Option<PathBuf>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolver.scan_window == 0 {
            return Err(Error::InvalidConfig("scan window must be non-zero".to_string()));
        }
        if self.resolver.anchor_symbol.trim().is_empty() {
            return Err(Error::InvalidConfig("anchor symbol is empty".to_string()));
        }
        self.sweep.validate()
    }

    /// Table from the configured signature file, or the built-in one
    pub fn signature_table(&self) -> Result<SignatureTable> {
        match &self.signatures {
            Some(path) => load_signatures(path),
            None => Ok(SignatureTable::builtin()),
        }
    }
}
