//! Scripted host for tests
//!
//! Tracks every reference handed out and released, and records calls made
//! through [`RoutineInvoker`] instead of executing anything.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use super::{
    HostVersion, NtStatus, ObjectPtr, ObjectRegistry, RoutineInvoker, STATUS_SUCCESS,
    SymbolResolver,
};
use crate::resolver::ResolvedRoutine;
use crate::signature::PointerWidth;

const PROCESS_OBJECT_BASE: u64 = 0xFFFF_A000_0000_0000;
const THREAD_OBJECT_BASE: u64 = 0xFFFF_B000_0000_0000;

/// One recorded call to the terminate routine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub routine: u64,
    pub thread: ObjectPtr,
    pub exit_status: NtStatus,
    pub direct_terminate: bool,
}

#[derive(Debug)]
pub struct MockHost {
    version: (u32, u32),
    width: PointerWidth,
    exports: HashMap<String, u64>,
    processes: BTreeMap<u32, ObjectPtr>,
    threads: BTreeMap<u32, (ObjectPtr, ObjectPtr)>,
    statuses: HashMap<ObjectPtr, NtStatus>,
    lookups: Cell<usize>,
    thread_lookups: Cell<usize>,
    releases: RefCell<Vec<ObjectPtr>>,
    invocations: RefCell<Vec<Invocation>>,
}

impl MockHost {
    pub fn new(major: u32, minor: u32, width: PointerWidth) -> Self {
        Self {
            version: (major, minor),
            width,
            exports: HashMap::new(),
            processes: BTreeMap::new(),
            threads: BTreeMap::new(),
            statuses: HashMap::new(),
            lookups: Cell::new(0),
            thread_lookups: Cell::new(0),
            releases: RefCell::new(Vec::new()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Windows 7 x64
    pub fn win7_x64() -> Self {
        Self::new(6, 1, PointerWidth::Bits64)
    }

    pub fn process_object(pid: u32) -> ObjectPtr {
        ObjectPtr::new(PROCESS_OBJECT_BASE + u64::from(pid) * 0x10)
    }

    pub fn thread_object(tid: u32) -> ObjectPtr {
        ObjectPtr::new(THREAD_OBJECT_BASE + u64::from(tid) * 0x10)
    }

    pub fn export(mut self, name: &str, address: u64) -> Self {
        self.exports.insert(name.to_string(), address);
        self
    }

    pub fn process(mut self, pid: u32) -> Self {
        self.processes.insert(pid, Self::process_object(pid));
        self
    }

    /// Register a thread owned by `owner_pid` (which need not be registered)
    pub fn thread(mut self, tid: u32, owner_pid: u32) -> Self {
        self.threads.insert(
            tid,
            (Self::thread_object(tid), Self::process_object(owner_pid)),
        );
        self
    }

    /// Make the terminate routine report `status` for this thread
    pub fn failing_thread(mut self, tid: u32, status: NtStatus) -> Self {
        self.statuses.insert(Self::thread_object(tid), status);
        self
    }

    /// Successful lookups of any kind
    pub fn successful_lookups(&self) -> usize {
        self.lookups.get()
    }

    /// Thread lookups attempted, successful or not
    pub fn thread_lookup_attempts(&self) -> usize {
        self.thread_lookups.get()
    }

    pub fn release_count(&self) -> usize {
        self.releases.borrow().len()
    }

    pub fn releases(&self) -> Vec<ObjectPtr> {
        self.releases.borrow().clone()
    }

    pub fn outstanding_references(&self) -> isize {
        self.lookups.get() as isize - self.release_count() as isize
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl HostVersion for MockHost {
    fn os_version(&self) -> (u32, u32) {
        self.version
    }

    fn pointer_width(&self) -> PointerWidth {
        self.width
    }
}

impl SymbolResolver for MockHost {
    fn export_address(&self, name: &str) -> Option<u64> {
        self.exports.get(name).copied()
    }
}

impl ObjectRegistry for MockHost {
    fn lookup_process(&self, pid: u32) -> Option<ObjectPtr> {
        let object = self.processes.get(&pid).copied()?;
        self.lookups.set(self.lookups.get() + 1);
        Some(object)
    }

    fn lookup_thread(&self, tid: u32) -> Option<ObjectPtr> {
        self.thread_lookups.set(self.thread_lookups.get() + 1);
        let (object, _) = self.threads.get(&tid).copied()?;
        self.lookups.set(self.lookups.get() + 1);
        Some(object)
    }

    fn owner_process(&self, thread: ObjectPtr) -> ObjectPtr {
        self.threads
            .values()
            .find(|(object, _)| *object == thread)
            .map(|(_, owner)| *owner)
            .unwrap_or(ObjectPtr::new(0))
    }

    fn release(&self, object: ObjectPtr) {
        self.releases.borrow_mut().push(object);
    }
}

impl RoutineInvoker for MockHost {
    unsafe fn terminate_thread(
        &self,
        routine: &ResolvedRoutine,
        thread: ObjectPtr,
        exit_status: NtStatus,
        direct_terminate: bool,
    ) -> NtStatus {
        self.invocations.borrow_mut().push(Invocation {
            routine: routine.address(),
            thread,
            exit_status,
            direct_terminate,
        });
        self.statuses
            .get(&thread)
            .copied()
            .unwrap_or(STATUS_SUCCESS)
    }
}
