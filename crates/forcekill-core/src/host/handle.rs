use std::fmt;

use super::{ObjectPtr, ObjectRegistry};
use crate::error::{Error, Result};

/// Referenced process object, released on drop.
pub struct ProcessHandle<'r, R: ObjectRegistry + ?Sized> {
    registry: &'r R,
    object: ObjectPtr,
    pid: u32,
}

impl<'r, R: ObjectRegistry + ?Sized> ProcessHandle<'r, R> {
    pub fn lookup(registry: &'r R, pid: u32) -> Result<Self> {
        let object = registry
            .lookup_process(pid)
            .ok_or(Error::ProcessNotFound(pid))?;
        Ok(Self {
            registry,
            object,
            pid,
        })
    }

    pub fn object(&self) -> ObjectPtr {
        self.object
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl<R: ObjectRegistry + ?Sized> Drop for ProcessHandle<'_, R> {
    fn drop(&mut self) {
        self.registry.release(self.object);
    }
}

impl<R: ObjectRegistry + ?Sized> fmt::Debug for ProcessHandle<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("object", &self.object)
            .finish()
    }
}

/// Referenced thread object, released on drop.
pub struct ThreadHandle<'r, R: ObjectRegistry + ?Sized> {
    registry: &'r R,
    object: ObjectPtr,
    tid: u32,
}

impl<'r, R: ObjectRegistry + ?Sized> ThreadHandle<'r, R> {
    pub fn lookup(registry: &'r R, tid: u32) -> Result<Self> {
        let object = registry
            .lookup_thread(tid)
            .ok_or(Error::ThreadLookupFailed(tid))?;
        Ok(Self {
            registry,
            object,
            tid,
        })
    }

    pub fn object(&self) -> ObjectPtr {
        self.object
    }

    pub fn tid(&self) -> u32 {
        self.tid
    }

    pub fn owner(&self) -> ObjectPtr {
        self.registry.owner_process(self.object)
    }

    pub fn belongs_to(&self, process: &ProcessHandle<'_, R>) -> bool {
        self.owner() == process.object()
    }
}

impl<R: ObjectRegistry + ?Sized> Drop for ThreadHandle<'_, R> {
    fn drop(&mut self) {
        self.registry.release(self.object);
    }
}

impl<R: ObjectRegistry + ?Sized> fmt::Debug for ThreadHandle<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("tid", &self.tid)
            .field("object", &self.object)
            .finish()
    }
}
