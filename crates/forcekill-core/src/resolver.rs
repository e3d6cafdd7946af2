//! Locate the unexported thread-terminate routine
//!
//! The exported anchor routine calls (or tail-jumps into) the routine we want
//! a few dozen bytes in. The signature table tells us which opcode to look for
//! on this build; the four bytes after it are a rel32 operand.
//!
//! ```text
//!  anchor                      match            match + 4
//!    │                           │                  │
//!    ▼                           ▼                  ▼
//!    ┌──────── ... ──────┬──────┬──────────────────┬─────
//!    │                   │ E8   │  disp32 (LE)     │ next instruction
//!    └──────── ... ──────┴──────┴──────────────────┴─────
//!
//!    target = (match + 4) + disp32
//! ```

use std::fmt;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::host::{HostVersion, SymbolResolver};
use crate::memory::{MemoryRange, MemoryScanner, ReadMemory};
use crate::signature::{OsVersionKey, PointerWidth, Signature, SignatureTable};

/// Size of the rel32 operand following the opcode
pub const DISPLACEMENT_SIZE: u64 = 4;

/// Address of the resolved terminate routine.
///
/// Only the resolver can produce one. The address is unverified: calling it is
/// exactly as safe as the signature match that produced it.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedRoutine {
    address: u64,
}

impl ResolvedRoutine {
    pub(crate) fn new(address: u64) -> Self {
        Self { address }
    }

    pub fn address(&self) -> u64 {
        self.address
    }
}

impl fmt::Display for ResolvedRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.address)
    }
}

/// Every intermediate value of one resolution, for diagnostics.
#[derive(Debug)]
pub struct Resolution {
    pub key: OsVersionKey,
    pub signature: Signature,
    pub anchor: u64,
    pub window: MemoryRange,
    /// Address right after the matched signature, where the operand starts
    pub operand: u64,
    pub displacement: i32,
    pub routine: ResolvedRoutine,
}

/// Decode a rel32 call/jump operand the way the CPU does.
///
/// The displacement is relative to the end of the 4-byte operand field, which
/// for E8/E9 is also the start of the next instruction.
pub fn decode_relative_target(operand: u64, displacement: i32, width: PointerWidth) -> u64 {
    let next_ip = operand.wrapping_add(DISPLACEMENT_SIZE);
    width.truncate(next_ip.wrapping_add_signed(i64::from(displacement)))
}

pub struct RoutineResolver<'a, H: ?Sized, M: ?Sized> {
    host: &'a H,
    memory: &'a M,
    table: &'a SignatureTable,
    config: ResolverConfig,
}

impl<'a, H, M> RoutineResolver<'a, H, M>
where
    H: HostVersion + SymbolResolver + ?Sized,
    M: ReadMemory + ?Sized,
{
    pub fn new(host: &'a H, memory: &'a M, table: &'a SignatureTable) -> Self {
        Self {
            host,
            memory,
            table,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolve(&self) -> Result<ResolvedRoutine> {
        self.resolve_detailed().map(|resolution| resolution.routine)
    }

    pub fn resolve_detailed(&self) -> Result<Resolution> {
        let key = OsVersionKey::detect(self.host);
        debug!("Resolving terminate routine for {}", key);

        let signature = self.table.require(&key)?.clone();
        debug!("  Signature: {}", signature);

        let anchor = self
            .host
            .export_address(&self.config.anchor_symbol)
            .ok_or_else(|| Error::AnchorNotFound(self.config.anchor_symbol.clone()))?;
        debug!("  Anchor {}: 0x{:X}", self.config.anchor_symbol, anchor);

        let window = MemoryRange::with_len(anchor, self.config.scan_window);
        let operand = MemoryScanner::new(self.memory)
            .search(&window, signature.as_bytes())?
            .ok_or_else(|| Error::PatternNotFound {
                pattern: signature.to_string(),
                start: window.start(),
                end: window.end(),
            })?;
        debug!(
            "  Signature matched at 0x{:X} (anchor+0x{:X})",
            operand - signature.len() as u64,
            operand - signature.len() as u64 - anchor
        );

        let displacement = self.memory.read_i32(operand)?;
        let target = decode_relative_target(operand, displacement, key.width);
        debug!("  Displacement {} -> routine at 0x{:X}", displacement, target);

        Ok(Resolution {
            key,
            signature,
            anchor,
            window,
            operand,
            displacement,
            routine: ResolvedRoutine::new(target),
        })
    }
}
