mod image;
mod reader;
pub mod scanner;

// Mock memory reader for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use image::MemoryImage;
pub use reader::{LiveMemory, ReadMemory};
pub use scanner::{MemoryRange, MemoryScanner, SCAN_CHUNK_SIZE};

#[doc(hidden)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
