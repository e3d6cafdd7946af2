//! # forcekill-core
//!
//! Locates the kernel's unexported thread-terminate routine by signature and
//! uses it to terminate every thread of a process.
//!
//! This crate provides:
//! - A per-OS-build signature table
//! - Bounded byte-pattern scanning over any [`ReadMemory`]
//! - Resolution of the routine from an exported anchor via its rel32 operand
//! - A thread-identifier sweep with scoped object references
//! - The orchestration tying those together ([`ForceTerminator`])
//!
//! The operating system itself is reached only through the traits in
//! [`host`], so everything above runs unchanged against mocks and captured
//! memory images.

pub mod config;
pub mod error;
pub mod host;
pub mod memory;
pub mod resolver;
pub mod signature;
pub mod sweeper;
pub mod terminator;

pub use config::{Config, ResolverConfig, SweepConfig};
pub use error::{Error, Result};
pub use host::{
    Host, HostVersion, NativeInvoker, NtStatus, ObjectPtr, ObjectRegistry, ProcessHandle,
    RoutineInvoker, SymbolResolver, ThreadHandle,
};
pub use memory::{LiveMemory, MemoryImage, MemoryRange, MemoryScanner, ReadMemory};
pub use resolver::{Resolution, ResolvedRoutine, RoutineResolver, decode_relative_target};
pub use signature::{
    OsVersionKey, PointerWidth, Signature, SignatureTable, format_pattern, load_signatures,
    parse_pattern, save_signatures,
};
pub use sweeper::{SweepReport, ThreadSweeper};
pub use terminator::{ForceTerminator, TerminationReport};
