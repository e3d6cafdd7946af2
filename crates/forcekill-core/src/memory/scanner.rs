//! Linear byte-pattern search over a bounded range

use std::fmt;

use memchr::memmem;
use tracing::trace;

use super::reader::ReadMemory;
use crate::error::{Error, Result};

/// Bytes fetched per read while scanning
pub const SCAN_CHUNK_SIZE: usize = 1024 * 1024;

/// Half-open address range `[start, end)`, with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRange {
    start: u64,
    end: u64,
}

impl MemoryRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidConfig(format!(
                "Range end 0x{:X} is below start 0x{:X}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Range of `len` bytes from `start`, clamped at the top of the address space
    pub fn with_len(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, address: u64) -> bool {
        (self.start..self.end).contains(&address)
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}..0x{:X}", self.start, self.end)
    }
}

/// Finds byte patterns in memory reachable through a [`ReadMemory`].
///
/// A match only counts when every byte of it lies inside the range. Nothing
/// outside the range is ever read.
pub struct MemoryScanner<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    chunk_size: usize,
}

impl<'a, R: ReadMemory + ?Sized> MemoryScanner<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self {
            reader,
            chunk_size: SCAN_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Address immediately after the first (lowest) full match, if any.
    ///
    /// An empty pattern is rejected rather than matching trivially.
    pub fn search(&self, range: &MemoryRange, pattern: &[u8]) -> Result<Option<u64>> {
        let mut found = None;
        self.scan(range, pattern, |start| {
            found = Some(start + pattern.len() as u64);
            false
        })?;
        Ok(found)
    }

    /// Start addresses of every match, in ascending order
    pub fn find_all(&self, range: &MemoryRange, pattern: &[u8]) -> Result<Vec<u64>> {
        let mut matches = Vec::new();
        self.scan(range, pattern, |start| {
            matches.push(start);
            true
        })?;
        Ok(matches)
    }

    /// Feed match start addresses to `on_match` until it returns `false`.
    fn scan<F>(&self, range: &MemoryRange, pattern: &[u8], mut on_match: F) -> Result<()>
    where
        F: FnMut(u64) -> bool,
    {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
        }
        if range.len() < pattern.len() as u64 {
            return Ok(());
        }

        let finder = memmem::Finder::new(pattern);
        let keep = pattern.len() - 1;
        let mut tail: Vec<u8> = Vec::new();
        let mut offset: u64 = 0;

        while offset < range.len() {
            let read_size = (range.len() - offset).min(self.chunk_size as u64) as usize;
            let addr = range.start + offset;
            let chunk = self.reader.read_bytes(addr, read_size)?;

            let mut data = Vec::with_capacity(tail.len() + chunk.len());
            data.extend_from_slice(&tail);
            data.extend_from_slice(&chunk);
            let data_base = addr - tail.len() as u64;

            for pos in finder.find_iter(&data) {
                let start = data_base + pos as u64;
                trace!("Pattern match at 0x{:X}", start);
                if !on_match(start) {
                    return Ok(());
                }
            }

            tail = data[data.len().saturating_sub(keep)..].to_vec();
            offset += read_size as u64;
        }

        Ok(())
    }
}
