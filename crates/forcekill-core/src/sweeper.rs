//! Brute-force thread enumeration
//!
//! There is no "threads of process X" primitive to call, so every candidate
//! identifier is looked up in turn. Most of them are unassigned and simply
//! fail the lookup.

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::SweepConfig;
use crate::error::Result;
use crate::host::{ObjectRegistry, ProcessHandle, ThreadHandle};

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Identifiers tried
    pub candidates: u32,
    /// Identifiers that resolved to a thread
    pub resolved: u32,
    /// Threads owned by the target and visited
    pub matched: u32,
}

pub struct ThreadSweeper<'a, R: ObjectRegistry + ?Sized> {
    registry: &'a R,
    config: SweepConfig,
}

impl<'a, R: ObjectRegistry + ?Sized> ThreadSweeper<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self {
            registry,
            config: SweepConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    /// Call `visit` for every thread owned by `target`.
    ///
    /// Each looked-up thread is released before the next identifier is tried,
    /// whether or not it matched.
    pub fn for_each_thread_of<F>(
        &self,
        target: &ProcessHandle<'_, R>,
        mut visit: F,
    ) -> Result<SweepReport>
    where
        F: FnMut(&ThreadHandle<'_, R>),
    {
        self.config.validate()?;
        debug!(
            "Sweeping thread ids {}..{} step {} for pid {}",
            self.config.first_id,
            self.config.end_id,
            self.config.step,
            target.pid()
        );

        let mut report = SweepReport::default();
        for tid in self.config.ids() {
            report.candidates += 1;

            let thread = match ThreadHandle::lookup(self.registry, tid) {
                Ok(thread) => thread,
                Err(e) => {
                    trace!("{}", e);
                    continue;
                }
            };
            report.resolved += 1;

            if thread.belongs_to(target) {
                trace!("Thread {} ({}) belongs to pid {}", tid, thread.object(), target.pid());
                report.matched += 1;
                visit(&thread);
            }
        }

        debug!(
            "Sweep done: {} candidates, {} threads, {} matched",
            report.candidates, report.resolved, report.matched
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::host::mock::MockHost;

    const TARGET: u32 = 2848;

    fn small_sweep() -> SweepConfig {
        SweepConfig {
            first_id: 4,
            end_id: 0x400,
            step: 4,
        }
    }

    #[test]
    fn test_visits_only_target_threads() {
        // 3 target threads, 4 foreign ones
        let host = MockHost::win7_x64()
            .process(TARGET)
            .thread(8, TARGET)
            .thread(12, 4)
            .thread(0x100, TARGET)
            .thread(0x104, 600)
            .thread(0x200, 600)
            .thread(0x3FC, TARGET)
            .thread(0x3F0, 4);
        let process = ProcessHandle::lookup(&host, TARGET).unwrap();

        let mut visited = Vec::new();
        let report = ThreadSweeper::new(&host)
            .with_config(small_sweep())
            .for_each_thread_of(&process, |thread| visited.push(thread.tid()))
            .unwrap();

        assert_eq!(visited, vec![8, 0x100, 0x3FC]);
        assert_eq!(report.matched, 3);
        assert_eq!(report.resolved, 7);
        assert_eq!(report.candidates, 0xFF);

        // One release per successful thread lookup, matched or not
        assert_eq!(host.release_count(), 7);
        drop(process);
        assert_eq!(host.release_count(), 8);
        assert_eq!(host.outstanding_references(), 0);
    }

    #[test]
    fn test_thread_released_before_next_lookup() {
        let host = MockHost::win7_x64()
            .process(TARGET)
            .thread(8, TARGET)
            .thread(16, TARGET);
        let process = ProcessHandle::lookup(&host, TARGET).unwrap();

        let mut outstanding = Vec::new();
        ThreadSweeper::new(&host)
            .with_config(small_sweep())
            .for_each_thread_of(&process, |_| outstanding.push(host.outstanding_references()))
            .unwrap();

        // Process reference + the thread being visited, never more
        assert_eq!(outstanding, vec![2, 2]);
    }

    #[test]
    fn test_unaligned_ids_are_not_tried() {
        let host = MockHost::win7_x64().process(TARGET).thread(6, TARGET);
        let process = ProcessHandle::lookup(&host, TARGET).unwrap();

        let report = ThreadSweeper::new(&host)
            .with_config(small_sweep())
            .for_each_thread_of(&process, |_| panic!("no thread should match"))
            .unwrap();

        assert_eq!(report.resolved, 0);
        assert_eq!(host.thread_lookup_attempts(), 0xFF);
    }

    #[test]
    fn test_default_bounds() {
        let host = MockHost::win7_x64()
            .process(TARGET)
            .thread(4, TARGET)
            .thread(0x7FFFC, TARGET)
            .thread(0x80000, TARGET);
        let process = ProcessHandle::lookup(&host, TARGET).unwrap();

        let mut visited = Vec::new();
        let report = ThreadSweeper::new(&host)
            .for_each_thread_of(&process, |thread| visited.push(thread.tid()))
            .unwrap();

        assert_eq!(visited, vec![4, 0x7FFFC]);
        assert_eq!(report.candidates, 0x1FFFF);
    }

    #[test]
    fn test_invalid_config() {
        let host = MockHost::win7_x64().process(TARGET);
        let process = ProcessHandle::lookup(&host, TARGET).unwrap();

        let err = ThreadSweeper::new(&host)
            .with_config(SweepConfig {
                step: 0,
                ..Default::default()
            })
            .for_each_thread_of(&process, |_| {})
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(host.thread_lookup_attempts(), 0);
    }
}
