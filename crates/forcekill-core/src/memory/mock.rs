//! Sparse in-memory reader for tests

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::reader::ReadMemory;
use crate::error::{Error, Result};

/// Reader over a set of disjoint regions that records every read.
#[derive(Debug, Default)]
pub struct MockMemoryReader {
    regions: BTreeMap<u64, Vec<u8>>,
    reads: RefCell<Vec<(u64, usize)>>,
}

impl MockMemoryReader {
    /// All `(address, size)` pairs requested so far
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads.borrow().clone()
    }

    /// Lowest and highest-exclusive address touched by any read
    pub fn touched_span(&self) -> Option<(u64, u64)> {
        let reads = self.reads.borrow();
        let lo = reads.iter().map(|(a, _)| *a).min()?;
        let hi = reads.iter().map(|(a, s)| a + *s as u64).max()?;
        Some((lo, hi))
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.borrow_mut().push((address, size));

        let (base, bytes) = self
            .regions
            .range(..=address)
            .next_back()
            .ok_or_else(|| unmapped(address))?;
        let start = (address - base) as usize;
        bytes
            .get(start..start + size)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| unmapped(address))
    }
}

fn unmapped(address: u64) -> Error {
    Error::MemoryReadFailed {
        address,
        message: "unmapped in mock".to_string(),
    }
}

/// Builder for [`MockMemoryReader`].
#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `size` bytes of `fill` at `base`
    pub fn region(mut self, base: u64, size: usize, fill: u8) -> Self {
        self.regions.insert(base, vec![fill; size]);
        self
    }

    /// Overwrite bytes inside an already mapped region
    pub fn write_bytes(mut self, address: u64, data: &[u8]) -> Self {
        let (base, bytes) = self
            .regions
            .range_mut(..=address)
            .next_back()
            .expect("write outside any mock region");
        let start = (address - *base) as usize;
        bytes[start..start + data.len()].copy_from_slice(data);
        self
    }

    pub fn write_i32(self, address: u64, value: i32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            regions: self.regions,
            reads: RefCell::new(Vec::new()),
        }
    }
}
