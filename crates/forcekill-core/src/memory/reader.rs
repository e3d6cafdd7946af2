use crate::error::{Error, Result};

/// Bounded reads from some address space.
///
/// The scanner and the displacement decoder only ever go through this trait,
/// so the same code runs against live memory, captured images and mocks.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes(to_array(address, &bytes)?))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes(to_array(address, &bytes)?))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes(to_array(address, &bytes)?))
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

fn to_array<const N: usize>(address: u64, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| Error::MemoryReadFailed {
        address,
        message: format!("short read: expected {} bytes, got {}", N, bytes.len()),
    })
}

/// Reads straight out of the current address space.
///
/// There is no probing: reading an unmapped address is undefined behaviour,
/// which is why construction is unsafe.
#[derive(Debug)]
pub struct LiveMemory {
    _private: (),
}

impl LiveMemory {
    /// # Safety
    ///
    /// Every range later passed to `read_bytes` must be mapped and readable
    /// for the lifetime of this value.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl ReadMemory for LiveMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address == 0 {
            return Err(Error::MemoryReadFailed {
                address,
                message: "null address".to_string(),
            });
        }
        let ptr = usize::try_from(address).map_err(|_| Error::MemoryReadFailed {
            address,
            message: "address exceeds pointer width".to_string(),
        })? as *const u8;

        // SAFETY: the caller of `LiveMemory::new` guaranteed the range is mapped.
        let slice = unsafe { std::slice::from_raw_parts(ptr, size) };
        Ok(slice.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_memory_reads_own_buffer() {
        let buffer: Vec<u8> = vec![0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF];
        let base = buffer.as_ptr() as u64;
        let memory = unsafe { LiveMemory::new() };

        assert_eq!(memory.read_bytes(base, 4).unwrap(), vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(memory.read_u32(base).unwrap(), 0x1234_5678);
        assert_eq!(memory.read_i32(base + 4).unwrap(), -1);
    }

    #[test]
    fn test_live_memory_rejects_null() {
        let memory = unsafe { LiveMemory::new() };
        assert!(matches!(
            memory.read_bytes(0, 1),
            Err(Error::MemoryReadFailed { address: 0, .. })
        ));
    }
}
