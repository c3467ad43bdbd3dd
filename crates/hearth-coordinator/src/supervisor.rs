// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Teardown-and-re-elect recovery.
//!
//! A proxy that loses its owner does not retry in place. The supervisor
//! shuts the whole coordinator down, waits briefly, and runs a new
//! election, which either finds the new owner or becomes it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hearth_config::HearthConfig;
use hearth_core::{HearthError, MessageBus, NamedLock};

use crate::coordinator::Coordinator;

/// Keeps one coordinator alive, replacing it after every restart request.
pub struct Supervisor {
    config: HearthConfig,
    lock: Arc<dyn NamedLock>,
    bus: Arc<dyn MessageBus>,
}

impl Supervisor {
    pub fn new(config: HearthConfig, lock: Arc<dyn NamedLock>, bus: Arc<dyn MessageBus>) -> Self {
        Self { config, lock, bus }
    }

    /// Supervise with the file lock and datagram bus named in `config`.
    #[cfg(unix)]
    pub fn from_config(config: HearthConfig) -> Self {
        let lock = Arc::new(crate::lock::FileLock::from_config(&config.election));
        let bus = Arc::new(hearth_bus::DatagramBus::from_config(&config.bus));
        Self::new(config, lock, bus)
    }

    /// Run until `shutdown` fires, a start fails, or the owner's storage
    /// engine dies.
    ///
    /// `on_ready` receives each new coordinator as soon as it is serving.
    /// A failed start (fatal storage error, unusable lock or bus) ends the
    /// loop with that error. An engine that dies while serving is shut down,
    /// releasing the lock, and its error ends the loop too.
    pub async fn run<F>(&self, shutdown: CancellationToken, mut on_ready: F) -> Result<(), HearthError>
    where
        F: FnMut(Arc<Coordinator>),
    {
        let mut generation: u64 = 0;
        loop {
            if shutdown.is_cancelled() {
                return Ok(());
            }
            generation += 1;
            let coordinator = match Coordinator::start(
                &self.config,
                Arc::clone(&self.lock),
                Arc::clone(&self.bus),
            )
            .await
            {
                Ok(coordinator) => Arc::new(coordinator),
                Err(e) => {
                    error!(generation, error = %e, "actor failed to start");
                    return Err(e);
                }
            };
            info!(generation, role = %coordinator.role(), "coordinator ready");
            on_ready(Arc::clone(&coordinator));

            tokio::select! {
                _ = shutdown.cancelled() => {
                    coordinator.shutdown().await?;
                    return Ok(());
                }
                _ = coordinator.restart_requested() => {
                    info!(generation, "owner presumed dead, re-running election");
                    coordinator.shutdown().await?;
                }
                err = coordinator.engine_failed() => {
                    error!(generation, error = %err, "storage engine died, stepping down");
                    if let Err(e) = coordinator.shutdown().await {
                        warn!(generation, error = %e, "shutdown after engine failure was not clean");
                    }
                    return Err(err);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.config.election.reelection_delay()) => {}
            }
        }
    }
}
