use thiserror::Error;

use crate::signature::OsVersionKey;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported OS version: {key}{}", gap_suffix(.known_gap))]
    UnsupportedVersion { key: OsVersionKey, known_gap: bool },

    #[error("Anchor routine not found: {0}")]
    AnchorNotFound(String),

    #[error("Signature {pattern} not found in {start:#x}..{end:#x}")]
    PatternNotFound { pattern: String, start: u64, end: u64 },

    #[error("Process not found: {0}")]
    ProcessNotFound(u32),

    #[error("Thread lookup failed: {0}")]
    ThreadLookupFailed(u32),

    #[error("Routine not resolved: {0}")]
    RoutineNotResolved(#[source] Box<Error>),

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Memory image of {len} bytes at {base:#x} runs past the end of the address space")]
    ImageOutOfRange { base: u64, len: usize },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Host query failed: {0}")]
    HostQueryFailed(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn gap_suffix(known_gap: &bool) -> &'static str {
    if *known_gap {
        " (known gap in signature table)"
    } else {
        ""
    }
}

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if this error came out of routine resolution, directly or wrapped
    pub fn is_resolution_failure(&self) -> bool {
        match self {
            Error::UnsupportedVersion { .. }
            | Error::AnchorNotFound(_)
            | Error::PatternNotFound { .. } => true,
            Error::RoutineNotResolved(_) => true,
            _ => false,
        }
    }
}
