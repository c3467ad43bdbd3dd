// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handoff to an external routine that pushes local state to a remote authority.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use hearth_core::HearthError;

use crate::coordinator::Coordinator;
use crate::facade::Facade;

/// Pushes local state somewhere durable. Reads go through the façade, so
/// the same routine works from either role.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn push(&self, facade: &Facade) -> Result<(), HearthError>;
}

/// What one successful sync covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub pushed_mutations: u64,
}

/// Push through `remote` and, only on success, clear the mutations it covered.
///
/// Mutations counted while the push was running stay pending.
pub async fn sync_to_remote(
    coordinator: &Coordinator,
    remote: &dyn RemoteSync,
) -> Result<SyncReport, HearthError> {
    let tracker = coordinator.tracker();
    let pending = tracker.count();
    match remote.push(coordinator.facade()).await {
        Ok(()) => {
            tracker.acknowledge(pending);
            info!(pushed_mutations = pending, "local changes synced");
            Ok(SyncReport {
                pushed_mutations: pending,
            })
        }
        Err(e) => {
            warn!(pending, error = %e, "sync failed, changes stay pending");
            Err(e)
        }
    }
}
