// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named, host-wide, non-reentrant exclusive lock.

use std::any::Any;
use std::fmt;

use crate::error::HearthError;

/// Proof of holding a [`NamedLock`].
///
/// There is no release method: the lock is released when the lease is
/// dropped, which includes the holding process exiting or crashing.
pub struct LockLease {
    name: String,
    _guard: Box<dyn Any + Send + Sync>,
}

impl LockLease {
    /// Wrap the backend-specific guard that keeps the lock held.
    pub fn new(name: impl Into<String>, guard: impl Any + Send + Sync) -> Self {
        Self {
            name: name.into(),
            _guard: Box::new(guard),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for LockLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockLease").field("name", &self.name).finish()
    }
}

/// A lock that all actors on the host agree on by name.
pub trait NamedLock: Send + Sync + 'static {
    /// The agreed-upon lock name.
    fn name(&self) -> &str;

    /// Try to take the lock without waiting.
    ///
    /// `Ok(None)` means another actor holds it. Errors are reserved for a
    /// lock that cannot be used at all (e.g. its directory is unwritable).
    fn try_acquire(&self) -> Result<Option<LockLease>, HearthError>;
}
