// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One actor's coordination state: election result, role bootstrap, and teardown.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use uuid::Uuid;

use hearth_config::HearthConfig;
use hearth_core::{ActorState, HearthError, LockLease, MessageBus, NamedLock, RequesterId, Role};
use hearth_storage::StorageEngine;

use crate::elector::Elector;
use crate::facade::Facade;
use crate::owner;
use crate::proxy::ProxyClient;
use crate::tracker::MutationTracker;

/// Snapshot for status reporting (role badge, unsynced-changes banner).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalStatus {
    pub role: Role,
    pub mutations: u64,
    pub state: ActorState,
}

/// A running actor in either role.
///
/// The role is fixed for the coordinator's lifetime. Changing it means
/// shutting this one down and starting a new one.
pub struct Coordinator {
    role: Role,
    facade: Facade,
    tracker: Arc<MutationTracker>,
    requester_id: Option<RequesterId>,
    engine: Option<Arc<StorageEngine>>,
    lease: Mutex<Option<LockLease>>,
    state: watch::Sender<ActorState>,
    restart: CancellationToken,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Coordinator {
    /// Elect, then bring up the role that won.
    ///
    /// An owner whose storage engine cannot open fails here with a fatal
    /// error, and its lease is released on the way out.
    pub async fn start(
        config: &HearthConfig,
        lock: Arc<dyn NamedLock>,
        bus: Arc<dyn MessageBus>,
    ) -> Result<Self, HearthError> {
        let (state, _) = watch::channel(ActorState::Unelected);
        let election = Elector::new(lock).elect()?;
        let tracker = Arc::new(MutationTracker::new());
        let restart = CancellationToken::new();
        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();

        let (facade, engine, requester_id) = match election.role {
            Role::Owner => {
                state.send_replace(ActorState::Initializing);
                let engine = Arc::new(StorageEngine::new(config.storage.clone()));
                if let Err(e) = engine.initialize().await {
                    state.send_replace(ActorState::Terminated);
                    return Err(e);
                }
                let receiver = match bus.subscribe().await {
                    Ok(receiver) => receiver,
                    Err(e) => {
                        if let Err(shutdown_err) = engine.shutdown().await {
                            warn!(error = %shutdown_err, "storage engine shutdown failed after subscribe error");
                        }
                        state.send_replace(ActorState::Terminated);
                        return Err(e);
                    }
                };
                owner::spawn_dispatch(
                    engine.clone(),
                    Arc::clone(&bus),
                    receiver,
                    &tasks,
                    shutdown.clone(),
                );
                let facade = Facade::new(engine.clone(), tracker.clone());
                (facade, Some(engine), None)
            }
            Role::Proxy => {
                let requester_id = RequesterId(Uuid::new_v4().to_string());
                let receiver = bus.subscribe().await?;
                let client = ProxyClient::new(
                    requester_id.clone(),
                    Arc::clone(&bus),
                    config.bus.query_timeout(),
                    restart.clone(),
                );
                client.spawn_listener(receiver, &tasks, shutdown.clone());
                let facade = Facade::new(Arc::new(client), tracker.clone());
                (facade, None, Some(requester_id))
            }
        };

        state.send_replace(ActorState::Serving(election.role));
        info!(role = %election.role, requester_id = ?requester_id, "actor serving");

        Ok(Self {
            role: election.role,
            facade,
            tracker,
            requester_id,
            engine,
            lease: Mutex::new(election.lease),
            state,
            restart,
            shutdown,
            tasks,
        })
    }

    /// Start with the file lock and datagram bus named in `config`.
    #[cfg(unix)]
    pub async fn from_config(config: &HearthConfig) -> Result<Self, HearthError> {
        let lock = Arc::new(crate::lock::FileLock::from_config(&config.election));
        let bus = Arc::new(hearth_bus::DatagramBus::from_config(&config.bus));
        Self::start(config, lock, bus).await
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn facade(&self) -> &Facade {
        &self.facade
    }

    /// This actor's bus identity; owners have none.
    pub fn requester_id(&self) -> Option<&RequesterId> {
        self.requester_id.as_ref()
    }

    pub fn mutation_count(&self) -> u64 {
        self.tracker.count()
    }

    pub fn reset_mutation_count(&self) {
        self.tracker.reset();
    }

    pub(crate) fn tracker(&self) -> &Arc<MutationTracker> {
        &self.tracker
    }

    pub fn status(&self) -> LocalStatus {
        LocalStatus {
            role: self.role,
            mutations: self.tracker.count(),
            state: *self.state.borrow(),
        }
    }

    /// Watch lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<ActorState> {
        self.state.subscribe()
    }

    /// Resolves once a proxy round trip has timed out and the owner is
    /// presumed dead. Never resolves for an owner.
    pub async fn restart_requested(&self) {
        self.restart.cancelled().await;
    }

    pub fn is_restart_requested(&self) -> bool {
        self.restart.is_cancelled()
    }

    /// The owner's storage engine; proxies have none.
    pub fn storage_engine(&self) -> Option<&Arc<StorageEngine>> {
        self.engine.as_ref()
    }

    /// Resolves with the fatal error once the owner's storage engine dies
    /// after startup. Never resolves for a proxy.
    pub async fn engine_failed(&self) -> HearthError {
        match &self.engine {
            Some(engine) => engine.failed().await,
            None => std::future::pending().await,
        }
    }

    /// Stop all loops, close the store, and release the lock.
    ///
    /// In-flight owner queries finish and are answered first. Calling this
    /// again is a no-op.
    pub async fn shutdown(&self) -> Result<(), HearthError> {
        if *self.state.borrow() == ActorState::Terminated {
            return Ok(());
        }
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;

        let mut result = Ok(());
        if let Some(engine) = &self.engine
            && let Err(e) = engine.shutdown().await
        {
            warn!(error = %e, "storage engine shutdown failed");
            result = Err(e);
        }
        // The store is closed before the lease goes, so the next owner can open it.
        let lease = self
            .lease
            .lock()
            .map_err(|_| HearthError::Internal("lease mutex poisoned".to_string()))?
            .take();
        drop(lease);

        self.state.send_replace(ActorState::Terminated);
        info!(role = %self.role, "actor terminated");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hearth_bus::LocalBus;
    use serde::Deserialize;
    use tempfile::TempDir;

    use crate::lock::FileLock;

    #[derive(Debug, Deserialize)]
    struct CounterRow {
        value: i64,
    }

    fn config(dir: &TempDir, timeout_ms: u64) -> HearthConfig {
        let mut config = HearthConfig::default();
        config.storage.database_path = dir.path().join("store.db").display().to_string();
        config.election.lock_dir = dir.path().display().to_string();
        config.bus.query_timeout_ms = timeout_ms;
        config
    }

    #[tokio::test]
    async fn owner_and_proxy_share_one_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 5_000);
        let lock = Arc::new(FileLock::from_config(&config.election));
        let bus = Arc::new(LocalBus::new(64));

        let owner = Coordinator::start(&config, lock.clone(), bus.clone()).await.unwrap();
        let proxy = Coordinator::start(&config, lock.clone(), bus.clone()).await.unwrap();
        assert_eq!(owner.role(), Role::Owner);
        assert_eq!(proxy.role(), Role::Proxy);
        assert!(owner.requester_id().is_none());
        assert!(proxy.requester_id().is_some());

        proxy
            .facade()
            .prepare("UPDATE counter SET value = ? WHERE id = 1")
            .bind([7])
            .run()
            .await
            .unwrap();
        let row: CounterRow = owner
            .facade()
            .prepare("SELECT value FROM counter WHERE id = 1")
            .first()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.value, 7);
        assert_eq!(proxy.mutation_count(), 1);
        assert_eq!(owner.mutation_count(), 0);

        proxy.shutdown().await.unwrap();
        owner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn state_and_status_track_the_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 5_000);
        let owner = Coordinator::start(
            &config,
            Arc::new(FileLock::from_config(&config.election)),
            Arc::new(LocalBus::new(8)),
        )
        .await
        .unwrap();

        let state = owner.state();
        assert_eq!(*state.borrow(), ActorState::Serving(Role::Owner));
        owner
            .facade()
            .prepare("INSERT INTO notes (text) VALUES ('x')")
            .run()
            .await
            .unwrap();
        let status = owner.status();
        assert_eq!(status.mutations, 1);
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({"role": "owner", "mutations": 1, "state": {"state": "serving", "role": "owner"}})
        );
        owner.reset_mutation_count();
        assert_eq!(owner.mutation_count(), 0);

        owner.shutdown().await.unwrap();
        assert_eq!(*state.borrow(), ActorState::Terminated);
        owner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn owner_shutdown_frees_lock_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 5_000);
        let lock = Arc::new(FileLock::from_config(&config.election));
        let bus = Arc::new(LocalBus::new(8));

        let first = Coordinator::start(&config, lock.clone(), bus.clone()).await.unwrap();
        first.shutdown().await.unwrap();

        let second = Coordinator::start(&config, lock, bus).await.unwrap();
        assert_eq!(second.role(), Role::Owner);
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn proxy_without_owner_requests_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 50);
        let lock = Arc::new(FileLock::from_config(&config.election));
        let _held = lock.try_acquire().unwrap().unwrap();

        let proxy = Coordinator::start(&config, lock.clone(), Arc::new(LocalBus::new(8)))
            .await
            .unwrap();
        assert_eq!(proxy.role(), Role::Proxy);
        let err = proxy
            .facade()
            .prepare("DELETE FROM notes")
            .run()
            .await
            .unwrap_err();
        assert!(err.requires_reelection());
        assert_eq!(proxy.mutation_count(), 0);
        tokio::time::timeout(Duration::from_secs(1), proxy.restart_requested())
            .await
            .unwrap();
        assert!(proxy.is_restart_requested());
        proxy.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn unopenable_store_is_fatal_and_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir, 5_000);
        // A directory where the database file should be.
        let blocker = dir.path().join("blocker");
        std::fs::create_dir_all(&blocker).unwrap();
        config.storage.database_path = blocker.display().to_string();

        let lock = Arc::new(FileLock::from_config(&config.election));
        let err = Coordinator::start(&config, lock.clone(), Arc::new(LocalBus::new(8)))
            .await
            .err()
            .unwrap();
        assert!(err.is_fatal(), "got {err:?}");
        assert!(!lock.is_held().unwrap());
    }

    /// A bus nobody can subscribe to.
    struct DeafBus;

    #[async_trait::async_trait]
    impl MessageBus for DeafBus {
        async fn publish(&self, _message: &hearth_core::BusMessage) -> Result<(), HearthError> {
            Ok(())
        }

        async fn subscribe(&self) -> Result<Box<dyn hearth_core::BusReceiver>, HearthError> {
            Err(HearthError::bus("bus directory unusable"))
        }
    }

    #[tokio::test]
    async fn subscribe_failure_closes_the_store_and_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir, 5_000);
        let lock = Arc::new(FileLock::from_config(&config.election));

        let err = Coordinator::start(&config, lock.clone(), Arc::new(DeafBus))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HearthError::Bus { .. }), "got {err:?}");
        assert!(!lock.is_held().unwrap());

        // The store was closed too, so the next owner can open it.
        let next = Coordinator::start(&config, lock, Arc::new(LocalBus::new(8)))
            .await
            .unwrap();
        assert_eq!(next.role(), Role::Owner);
        next.shutdown().await.unwrap();
    }
}
