// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role election over a named lock.
//!
//! One non-blocking attempt: the winner is the owner for as long as it holds
//! the lease, everyone else is a proxy. There is no queueing and no renewal.

use std::sync::Arc;

use tracing::info;

use hearth_core::{HearthError, LockLease, NamedLock, Role};

/// Outcome of one election.
#[derive(Debug)]
pub struct Election {
    pub role: Role,
    /// Held by the owner only. Dropping it ends the ownership.
    pub lease: Option<LockLease>,
}

/// Runs elections against one lock.
#[derive(Clone)]
pub struct Elector {
    lock: Arc<dyn NamedLock>,
}

impl Elector {
    pub fn new(lock: Arc<dyn NamedLock>) -> Self {
        Self { lock }
    }

    /// Try the lock once. Contention resolves to [`Role::Proxy`], never an error.
    pub fn elect(&self) -> Result<Election, HearthError> {
        let lease = self.lock.try_acquire()?;
        let role = if lease.is_some() {
            Role::Owner
        } else {
            Role::Proxy
        };
        info!(lock = self.lock.name(), role = %role, "elected");
        Ok(Election { role, lease })
    }
}
