// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-actor test harness.
//!
//! `TestCluster` gives every actor it starts the same temp store path, lock
//! directory, and bus, the way separate processes on one host would share
//! them. Timeouts are short so failure paths run quickly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use hearth_bus::{DatagramBus, LocalBus};
use hearth_config::HearthConfig;
use hearth_coordinator::{Coordinator, FileLock, Supervisor};
use hearth_core::{HearthError, MessageBus, NamedLock};

use crate::lock::CountingLock;

/// Builder for clusters with non-default timing or transport.
pub struct TestClusterBuilder {
    query_timeout_ms: u64,
    reelection_delay_ms: u64,
    datagram_bus: bool,
}

impl TestClusterBuilder {
    fn new() -> Self {
        Self {
            query_timeout_ms: 2_000,
            reelection_delay_ms: 10,
            datagram_bus: false,
        }
    }

    /// Proxy round-trip timeout.
    pub fn with_query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = ms;
        self
    }

    /// Pause between teardown and the next election.
    pub fn with_reelection_delay_ms(mut self, ms: u64) -> Self {
        self.reelection_delay_ms = ms;
        self
    }

    /// Use Unix datagram sockets instead of the in-process bus.
    pub fn with_datagram_bus(mut self) -> Self {
        self.datagram_bus = true;
        self
    }

    pub fn build(self) -> Result<TestCluster, HearthError> {
        let dir = TempDir::new().map_err(|e| HearthError::Storage { source: e.into() })?;

        let mut config = HearthConfig::default();
        config.storage.database_path = dir.path().join("hearth.db").display().to_string();
        config.election.lock_dir = dir.path().join("run").display().to_string();
        config.election.reelection_delay_ms = self.reelection_delay_ms;
        config.bus.directory = dir.path().join("bus").display().to_string();
        config.bus.query_timeout_ms = self.query_timeout_ms;

        let bus: Arc<dyn MessageBus> = if self.datagram_bus {
            Arc::new(DatagramBus::from_config(&config.bus))
        } else {
            Arc::new(LocalBus::new(config.bus.local_capacity))
        };
        let lock = Arc::new(CountingLock::new(Arc::new(FileLock::from_config(
            &config.election,
        ))));

        Ok(TestCluster {
            dir,
            config,
            lock,
            bus,
        })
    }
}

/// Isolated host for a set of actors.
pub struct TestCluster {
    dir: TempDir,
    config: HearthConfig,
    lock: Arc<CountingLock>,
    bus: Arc<dyn MessageBus>,
}

impl TestCluster {
    pub fn builder() -> TestClusterBuilder {
        TestClusterBuilder::new()
    }

    /// Cluster with default test timings on the in-process bus.
    pub fn new() -> Result<Self, HearthError> {
        Self::builder().build()
    }

    pub fn config(&self) -> &HearthConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.config.storage.database_path)
    }

    pub fn lock(&self) -> Arc<dyn NamedLock> {
        self.lock.clone()
    }

    pub fn bus(&self) -> Arc<dyn MessageBus> {
        Arc::clone(&self.bus)
    }

    /// Elections attempted across every actor in this cluster.
    pub fn election_attempts(&self) -> usize {
        self.lock.attempts()
    }

    /// Start one actor on the shared lock and bus.
    pub async fn start_actor(&self) -> Result<Coordinator, HearthError> {
        Coordinator::start(&self.config, self.lock(), self.bus()).await
    }

    /// Start `n` actors concurrently.
    pub async fn start_actors(&self, n: usize) -> Result<Vec<Coordinator>, HearthError> {
        let mut handles = Vec::with_capacity(n);
        for _ in 0..n {
            let config = self.config.clone();
            let lock = self.lock();
            let bus = self.bus();
            handles.push(tokio::spawn(async move {
                Coordinator::start(&config, lock, bus).await
            }));
        }
        let mut actors = Vec::with_capacity(n);
        for handle in handles {
            let actor = handle
                .await
                .map_err(|e| HearthError::Internal(format!("actor task failed: {e}")))??;
            actors.push(actor);
        }
        Ok(actors)
    }

    /// A supervisor sharing this cluster's lock and bus.
    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(self.config.clone(), self.lock(), self.bus())
    }

    /// Shut down every actor, owners last so proxies never see a dead owner.
    pub async fn shutdown_all(&self, actors: &[Coordinator]) -> Result<(), HearthError> {
        for actor in actors.iter().filter(|a| a.role() == hearth_core::Role::Proxy) {
            actor.shutdown().await?;
        }
        for actor in actors.iter().filter(|a| a.role() == hearth_core::Role::Owner) {
            actor.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cluster_paths_are_isolated() {
        let a = TestCluster::new().unwrap();
        let b = TestCluster::new().unwrap();
        assert_ne!(a.database_path(), b.database_path());
        assert!(a.database_path().starts_with(a.root()));
    }

    #[tokio::test]
    async fn first_actor_owns() {
        let cluster = TestCluster::new().unwrap();
        let actor = cluster.start_actor().await.unwrap();
        assert_eq!(actor.role(), hearth_core::Role::Owner);
        assert_eq!(cluster.election_attempts(), 1);
        actor.shutdown().await.unwrap();
    }
}
