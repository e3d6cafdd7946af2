use std::fs;
use std::path::Path;

use tracing::debug;

use super::reader::ReadMemory;
use crate::error::{Error, Result};

/// A captured region of memory, mapped at the address it was dumped from.
///
/// `base + len` always fits in a `u64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    base: u64,
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn new(base: u64, bytes: Vec<u8>) -> Result<Self> {
        let fits = u64::try_from(bytes.len())
            .ok()
            .and_then(|len| base.checked_add(len))
            .is_some();
        if !fits {
            return Err(Error::ImageOutOfRange {
                base,
                len: bytes.len(),
            });
        }
        Ok(Self { base, bytes })
    }

    /// Load a raw dump from disk
    pub fn from_file<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let bytes = fs::read(&path)?;
        debug!(
            "Loaded memory image {:?} ({} bytes) at 0x{:X}",
            path.as_ref(),
            bytes.len(),
            base
        );
        Self::new(base, bytes)
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// First address past the image
    pub fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ReadMemory for MemoryImage {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let out_of_bounds = || Error::MemoryReadFailed {
            address,
            message: format!(
                "{} bytes outside image 0x{:X}..0x{:X}",
                size,
                self.base,
                self.end()
            ),
        };

        let start = address
            .checked_sub(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or_else(out_of_bounds)?;
        let end = start.checked_add(size).ok_or_else(out_of_bounds)?;
        self.bytes
            .get(start..end)
            .map(<[u8]>::to_vec)
            .ok_or_else(out_of_bounds)
    }
}
