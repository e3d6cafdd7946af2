//! Interfaces to the operating system the core runs against
//!
//! Everything the resolver and the sweeper need from the kernel goes through
//! these traits: version query, export lookup, the process/thread object
//! registry and the final call into the resolved routine.

mod handle;
mod native;
#[cfg(target_os = "windows")]
pub mod windows;

#[doc(hidden)]
pub mod mock;

use std::fmt;

pub use handle::{ProcessHandle, ThreadHandle};
pub use native::NativeInvoker;

use crate::resolver::ResolvedRoutine;
use crate::signature::PointerWidth;

/// Opaque pointer to a referenced kernel object (process or thread).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPtr(u64);

impl ObjectPtr {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// NT status code returned by the resolved routine
pub type NtStatus = i32;

pub const STATUS_SUCCESS: NtStatus = 0;

/// Success and informational codes are non-negative
pub fn nt_success(status: NtStatus) -> bool {
    status >= 0
}

pub trait HostVersion {
    /// `(major, minor)` of the running OS
    fn os_version(&self) -> (u32, u32);

    fn pointer_width(&self) -> PointerWidth {
        PointerWidth::native()
    }
}

pub trait SymbolResolver {
    /// Runtime address of an exported routine
    fn export_address(&self, name: &str) -> Option<u64>;
}

/// Reference-counted process and thread objects.
///
/// Every object returned by a lookup carries a reference that must be passed
/// back to `release` exactly once. [`ProcessHandle`] and [`ThreadHandle`] do
/// that on drop.
pub trait ObjectRegistry {
    fn lookup_process(&self, pid: u32) -> Option<ObjectPtr>;

    fn lookup_thread(&self, tid: u32) -> Option<ObjectPtr>;

    fn owner_process(&self, thread: ObjectPtr) -> ObjectPtr;

    fn release(&self, object: ObjectPtr);
}

pub trait RoutineInvoker {
    /// Call the resolved terminate routine on one thread.
    ///
    /// # Safety
    ///
    /// `routine` must really be the thread-terminate routine of the running
    /// kernel and `thread` a referenced thread object. Nothing here can check
    /// either.
    unsafe fn terminate_thread(
        &self,
        routine: &ResolvedRoutine,
        thread: ObjectPtr,
        exit_status: NtStatus,
        direct_terminate: bool,
    ) -> NtStatus;
}

/// Everything the resolver and sweeper need from one host.
pub trait Host: HostVersion + SymbolResolver + ObjectRegistry {}

impl<T: HostVersion + SymbolResolver + ObjectRegistry + ?Sized> Host for T {}
