use std::sync::atomic::{AtomicBool, Ordering};

use super::EngineError;

/// In-process, non-blocking run lock. A second run fails fast instead of
/// queueing behind the first.
#[derive(Debug)]
pub(crate) struct RunLock {
    name: &'static str,
    held: AtomicBool,
}

impl RunLock {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self {
            name,
            held: AtomicBool::new(false),
        }
    }

    pub(crate) fn try_acquire(&self) -> Result<RunGuard<'_>, EngineError> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::RunInProgress(self.name))?;
        Ok(RunGuard { lock: self })
    }

    pub(crate) fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases the lock on drop, including on early return and panic.
#[derive(Debug)]
pub(crate) struct RunGuard<'a> {
    lock: &'a RunLock,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
