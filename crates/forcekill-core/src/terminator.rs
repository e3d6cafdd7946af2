//! Terminate every thread of a process through the resolved routine

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{Host, NtStatus, ProcessHandle, RoutineInvoker, nt_success};
use crate::memory::ReadMemory;
use crate::resolver::RoutineResolver;
use crate::signature::SignatureTable;
use crate::sweeper::{SweepReport, ThreadSweeper};

/// Exit status handed to every terminated thread
pub const THREAD_EXIT_STATUS: NtStatus = 0;

/// Outcome of one `force_kill`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerminationReport {
    pub pid: u32,
    pub routine: u64,
    pub sweep: SweepReport,
    /// Threads for which the routine returned a success status
    pub terminated: u32,
    /// Threads for which it returned an error status
    pub failed: u32,
}

pub struct ForceTerminator<'a, H: ?Sized, M: ?Sized, I: ?Sized> {
    host: &'a H,
    memory: &'a M,
    invoker: &'a I,
    table: &'a SignatureTable,
    config: Config,
}

impl<'a, H, M, I> ForceTerminator<'a, H, M, I>
where
    H: Host + ?Sized,
    M: ReadMemory + ?Sized,
    I: RoutineInvoker + ?Sized,
{
    pub fn new(host: &'a H, memory: &'a M, invoker: &'a I, table: &'a SignatureTable) -> Self {
        Self {
            host,
            memory,
            invoker,
            table,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Resolve the terminate routine and run it against every thread of `pid`.
    ///
    /// Nothing is terminated unless resolution succeeds. Once it has, every
    /// matching thread is attempted and failures are only counted.
    ///
    /// # Safety
    ///
    /// The invoker will call whatever address resolution produced. The caller
    /// must be running on a kernel covered by the signature table and pass an
    /// invoker whose calls are valid there.
    pub unsafe fn force_kill(&self, pid: u32) -> Result<TerminationReport> {
        info!("Force killing pid {}", pid);
        let process = ProcessHandle::lookup(self.host, pid)?;

        let routine = RoutineResolver::new(self.host, self.memory, self.table)
            .with_config(self.config.resolver.clone())
            .resolve()
            .map_err(|e| Error::RoutineNotResolved(Box::new(e)))?;
        debug!("Terminate routine resolved at {}", routine);

        let mut terminated = 0u32;
        let mut failed = 0u32;
        let sweep = ThreadSweeper::new(self.host)
            .with_config(self.config.sweep)
            .for_each_thread_of(&process, |thread| {
                // SAFETY: forwarded from this function's contract.
                let status = unsafe {
                    self.invoker
                        .terminate_thread(&routine, thread.object(), THREAD_EXIT_STATUS, true)
                };
                if nt_success(status) {
                    terminated += 1;
                } else {
                    warn!(
                        "Terminating thread {} failed: status 0x{:08X}",
                        thread.tid(),
                        status
                    );
                    failed += 1;
                }
            })?;

        info!(
            "pid {}: {} threads terminated, {} failed",
            pid, terminated, failed
        );
        Ok(TerminationReport {
            pid,
            routine: routine.address(),
            sweep,
            terminated,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;
    use crate::host::mock::MockHost;
    use crate::memory::MemoryImage;
    use crate::signature::PointerWidth;

    const ANCHOR: u64 = 0xFFFF_F800_02A0_0000;
    const TARGET: u32 = 2848;

    fn anchor_memory(displacement: i32) -> MemoryImage {
        let mut bytes = vec![0x90u8; 0x100];
        bytes[0x20] = 0xE8;
        bytes[0x21..0x25].copy_from_slice(&displacement.to_le_bytes());
        MemoryImage::new(ANCHOR, bytes).unwrap()
    }

    fn small_config() -> Config {
        Config {
            sweep: SweepConfig {
                first_id: 4,
                end_id: 0x200,
                step: 4,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_force_kill_terminates_target_threads() {
        let host = MockHost::win7_x64()
            .export("PsTerminateSystemThread", ANCHOR)
            .process(TARGET)
            .thread(8, TARGET)
            .thread(12, 4)
            .thread(0x1F0, TARGET);
        let memory = anchor_memory(0x4000);
        let table = SignatureTable::builtin();

        let report = unsafe {
            ForceTerminator::new(&host, &memory, &host, &table)
                .with_config(small_config())
                .force_kill(TARGET)
        }
        .unwrap();

        let expected_routine = ANCHOR + 0x21 + 4 + 0x4000;
        assert_eq!(report.routine, expected_routine);
        assert_eq!(report.terminated, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.sweep.matched, 2);

        let invocations = host.invocations();
        assert_eq!(invocations.len(), 2);
        for (invocation, tid) in invocations.iter().zip([8, 0x1F0]) {
            assert_eq!(invocation.routine, expected_routine);
            assert_eq!(invocation.thread, MockHost::thread_object(tid));
            assert_eq!(invocation.exit_status, 0);
            assert!(invocation.direct_terminate);
        }

        assert_eq!(host.outstanding_references(), 0);
    }

    #[test]
    fn test_zero_threads_is_success() {
        let host = MockHost::win7_x64()
            .export("PsTerminateSystemThread", ANCHOR)
            .process(TARGET)
            .thread(8, 4);
        let memory = anchor_memory(0x10);
        let table = SignatureTable::builtin();

        let report = unsafe {
            ForceTerminator::new(&host, &memory, &host, &table)
                .with_config(small_config())
                .force_kill(TARGET)
        }
        .unwrap();

        assert_eq!(report.terminated, 0);
        assert_eq!(report.sweep.matched, 0);
        assert!(host.invocations().is_empty());
        assert_eq!(host.outstanding_references(), 0);
    }

    #[test]
    fn test_process_not_found() {
        let host = MockHost::win7_x64().export("PsTerminateSystemThread", ANCHOR);
        let memory = anchor_memory(0x10);
        let table = SignatureTable::builtin();

        let err = unsafe { ForceTerminator::new(&host, &memory, &host, &table).force_kill(99) }
            .unwrap_err();
        assert!(matches!(err, Error::ProcessNotFound(99)));
        assert_eq!(host.thread_lookup_attempts(), 0);
    }

    #[test]
    fn test_routine_not_resolved_visits_nothing() {
        let table = SignatureTable::builtin();
        let memory = anchor_memory(0x10);
        let failing_hosts = [
            // Unsupported version
            MockHost::new(6, 0, PointerWidth::Bits64)
                .export("PsTerminateSystemThread", ANCHOR)
                .process(TARGET)
                .thread(8, TARGET),
            // Anchor missing
            MockHost::win7_x64().process(TARGET).thread(8, TARGET),
            // 6.2 x64 needs E9, which the image does not contain
            MockHost::new(6, 2, PointerWidth::Bits64)
                .export("PsTerminateSystemThread", ANCHOR)
                .process(TARGET)
                .thread(8, TARGET),
        ];

        for host in &failing_hosts {
            let err = unsafe {
                ForceTerminator::new(host, &memory, host, &table)
                    .with_config(small_config())
                    .force_kill(TARGET)
            }
            .unwrap_err();

            assert!(matches!(err, Error::RoutineNotResolved(_)), "{:?}", err);
            assert_eq!(host.thread_lookup_attempts(), 0);
            assert!(host.invocations().is_empty());
            // Process reference released on the error path
            assert_eq!(host.outstanding_references(), 0);
        }
    }

    #[test]
    fn test_failed_status_does_not_stop_sweep() {
        let host = MockHost::win7_x64()
            .export("PsTerminateSystemThread", ANCHOR)
            .process(TARGET)
            .thread(8, TARGET)
            .thread(16, TARGET)
            .thread(24, TARGET)
            .failing_thread(16, 0xC000_0022_u32 as i32);
        let memory = anchor_memory(-0x100);
        let table = SignatureTable::builtin();

        let report = unsafe {
            ForceTerminator::new(&host, &memory, &host, &table)
                .with_config(small_config())
                .force_kill(TARGET)
        }
        .unwrap();

        assert_eq!(report.terminated, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(host.invocations().len(), 3);
    }
}
