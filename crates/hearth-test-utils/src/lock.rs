// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lock wrapper that makes election attempts observable.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hearth_core::{HearthError, LockLease, NamedLock};

/// Delegates to an inner lock and counts every acquisition attempt.
pub struct CountingLock {
    inner: Arc<dyn NamedLock>,
    attempts: AtomicUsize,
}

impl CountingLock {
    pub fn new(inner: Arc<dyn NamedLock>) -> Self {
        Self {
            inner,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Elections run through this lock so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl NamedLock for CountingLock {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn try_acquire(&self) -> Result<Option<LockLease>, HearthError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.try_acquire()
    }
}
