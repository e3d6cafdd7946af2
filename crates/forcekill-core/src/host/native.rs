use std::ffi::c_void;

use super::{NtStatus, ObjectPtr, RoutineInvoker};
use crate::resolver::ResolvedRoutine;

/// `NTSTATUS (PETHREAD Thread, NTSTATUS ExitStatus, BOOLEAN DirectTerminate)`
type TerminateThreadFn =
    unsafe extern "system" fn(thread: *mut c_void, exit_status: NtStatus, direct: u8) -> NtStatus;

/// Calls the resolved address directly with the host calling convention.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeInvoker;

impl RoutineInvoker for NativeInvoker {
    unsafe fn terminate_thread(
        &self,
        routine: &ResolvedRoutine,
        thread: ObjectPtr,
        exit_status: NtStatus,
        direct_terminate: bool,
    ) -> NtStatus {
        // SAFETY: the caller vouches that the address is the terminate routine.
        unsafe {
            let entry = std::mem::transmute::<usize, TerminateThreadFn>(routine.address() as usize);
            entry(
                thread.as_raw() as usize as *mut c_void,
                exit_status,
                u8::from(direct_terminate),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static LAST_THREAD: AtomicU64 = AtomicU64::new(0);
    static LAST_ARGS: AtomicU64 = AtomicU64::new(0);

    unsafe extern "system" fn fake_terminate(
        thread: *mut c_void,
        exit_status: NtStatus,
        direct: u8,
    ) -> NtStatus {
        LAST_THREAD.store(thread as usize as u64, Ordering::SeqCst);
        LAST_ARGS.store(((exit_status as u32 as u64) << 8) | direct as u64, Ordering::SeqCst);
        0x7
    }

    #[test]
    fn test_native_invoker_passes_arguments() {
        let routine = ResolvedRoutine::new(fake_terminate as TerminateThreadFn as usize as u64);
        let status = unsafe {
            NativeInvoker.terminate_thread(&routine, ObjectPtr::new(0xABC0), 0, true)
        };

        assert_eq!(status, 0x7);
        assert_eq!(LAST_THREAD.load(Ordering::SeqCst), 0xABC0);
        assert_eq!(LAST_ARGS.load(Ordering::SeqCst), 1);
    }
}
