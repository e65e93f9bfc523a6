//! Non-blocking per-conversation exclusion.
//!
//! A conversation may have at most one turn in flight. A second turn that
//! arrives while the first is still playing is dropped, not queued.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use log::debug;

#[derive(Debug, Default)]
pub struct SessionLocks {
    active: Mutex<HashSet<String>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` busy. Returns false if it already was.
    pub fn acquire(&self, id: &str) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let acquired = active.insert(id.to_string());
        if !acquired {
            debug!("session '{id}' is busy");
        }
        acquired
    }

    pub fn release(&self, id: &str) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.remove(id);
    }

    pub fn is_locked(&self, id: &str) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.contains(id)
    }

    /// Acquire `id` and release it again when the guard is dropped.
    pub fn try_lock(&self, id: &str) -> Option<SessionGuard<'_>> {
        self.acquire(id).then(|| SessionGuard {
            locks: self,
            id: id.to_string(),
        })
    }
}

/// Holds a conversation's lock for as long as it lives.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    locks: &'a SessionLocks,
    id: String,
}

impl SessionGuard<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.id);
    }
}
