// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owner's storage engine: lazy open, health, shutdown, and execution.

use std::sync::OnceLock;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use hearth_config::model::StorageConfig;
use hearth_core::{ExecMode, ExecOutcome, HealthStatus, HearthError, StatementExecutor};

use crate::database::Database;

/// SQLite-backed storage engine.
///
/// The database is opened by [`StorageEngine::initialize`]. Once a fatal
/// error is observed the engine is poisoned and refuses further work, and
/// [`StorageEngine::failed`] resolves so the owning actor can stop.
pub struct StorageEngine {
    config: StorageConfig,
    db: OnceCell<Database>,
    failure: OnceLock<String>,
    failed: CancellationToken,
}

impl StorageEngine {
    /// Create an engine for `config`. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            failure: OnceLock::new(),
            failed: CancellationToken::new(),
        }
    }

    /// Wrap an already-open database (used for in-memory stores).
    pub fn from_database(db: Database) -> Self {
        let config = StorageConfig {
            database_path: db.path().to_string(),
            ..StorageConfig::default()
        };
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
            failure: OnceLock::new(),
            failed: CancellationToken::new(),
        }
    }

    /// Open the backing store, creating and seeding it when absent.
    ///
    /// Failure here is fatal for the actor: it cannot serve as owner.
    pub async fn initialize(&self) -> Result<(), HearthError> {
        let db = match Database::open(&self.config).await {
            Ok(db) => db,
            Err(e) => {
                error!(path = %self.config.database_path, error = %e, "storage engine failed to start");
                let fatal = match e {
                    HearthError::StoreLocked { .. } | HearthError::EngineUnavailable { .. } => e,
                    other => HearthError::EngineUnavailable {
                        reason: other.to_string(),
                    },
                };
                self.poison(&fatal);
                return Err(fatal);
            }
        };
        self.db.set(db).map_err(|_| HearthError::Storage {
            source: "storage engine already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "storage engine initialized");
        Ok(())
    }

    /// Path of the backing store.
    pub fn path(&self) -> &str {
        &self.config.database_path
    }

    /// The open database, unless the engine is uninitialized or poisoned.
    pub fn database(&self) -> Result<&Database, HearthError> {
        if let Some(reason) = self.failure.get() {
            return Err(HearthError::EngineUnavailable {
                reason: reason.clone(),
            });
        }
        self.db.get().ok_or_else(|| HearthError::EngineUnavailable {
            reason: "storage engine not initialized".to_string(),
        })
    }

    fn poison(&self, err: &HearthError) {
        let reason = match err {
            HearthError::EngineUnavailable { reason } => reason.clone(),
            other => other.to_string(),
        };
        if self.failure.set(reason).is_ok() {
            error!(error = %err, "storage engine poisoned");
            self.failed.cancel();
        }
    }

    /// Token cancelled when the engine is poisoned. A clean shutdown leaves
    /// it untouched.
    pub fn failure_token(&self) -> CancellationToken {
        self.failed.clone()
    }

    /// Resolves with the fatal error once the engine is poisoned.
    pub async fn failed(&self) -> HearthError {
        self.failed.cancelled().await;
        HearthError::EngineUnavailable {
            reason: self
                .failure
                .get()
                .cloned()
                .unwrap_or_else(|| "storage engine failed".to_string()),
        }
    }

    /// Check the connection with a trivial statement.
    pub async fn health_check(&self) -> HealthStatus {
        let db = match self.database() {
            Ok(db) => db,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };
        match db.execute("SELECT 1", &[], ExecMode::First).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) if e.is_fatal() => HealthStatus::Unhealthy(e.to_string()),
            Err(e) => HealthStatus::Degraded(e.to_string()),
        }
    }

    /// Checkpoint and close the store, releasing the file.
    ///
    /// Safe to call more than once and on an engine that never opened.
    pub async fn shutdown(&self) -> Result<(), HearthError> {
        let Some(db) = self.db.get() else {
            return Ok(());
        };
        let poisoned = self.failure.get().is_some();
        let result = db.close().await;
        let _ = self.failure.set("storage engine shut down".to_string());
        if poisoned {
            // Best effort: release the file for the next owner.
            return Ok(());
        }
        match result {
            Ok(()) => {
                debug!("shutdown: WAL checkpoint complete");
                Ok(())
            }
            Err(e) if e.is_fatal() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StatementExecutor for StorageEngine {
    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        mode: ExecMode,
    ) -> Result<ExecOutcome, HearthError> {
        let db = self.database()?;
        let result = db.execute(sql, params, mode).await;
        if let Err(e) = &result
            && e.is_fatal()
        {
            self.poison(e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn config_in(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("engine.db").display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn uninitialized_engine_is_unavailable() {
        let dir = tempdir().unwrap();
        let engine = StorageEngine::new(config_in(&dir));
        let err = engine
            .execute("SELECT 1", &[], ExecMode::First)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(engine.health_check().await, HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn initialize_then_execute() {
        let dir = tempdir().unwrap();
        let engine = StorageEngine::new(config_in(&dir));
        engine.initialize().await.unwrap();
        assert_eq!(engine.health_check().await, HealthStatus::Healthy);

        let out = engine
            .execute(
                "UPDATE counter SET value = value + ? WHERE id = 1 RETURNING value",
                &[json!(8)],
                ExecMode::First,
            )
            .await
            .unwrap();
        assert_eq!(out.rows[0]["value"], json!(50));
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let engine = StorageEngine::from_database(Database::open_in_memory().await.unwrap());
        let err = engine.initialize().await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn locked_store_poisons_second_engine() {
        let dir = tempdir().unwrap();
        let first = StorageEngine::new(config_in(&dir));
        first.initialize().await.unwrap();

        let second = StorageEngine::new(config_in(&dir));
        let err = second.initialize().await.unwrap_err();
        assert!(matches!(err, HearthError::StoreLocked { .. }));

        let err = second
            .execute("SELECT 1", &[], ExecMode::First)
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::EngineUnavailable { .. }));
        first.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_and_final() {
        let dir = tempdir().unwrap();
        let engine = StorageEngine::new(config_in(&dir));
        engine.initialize().await.unwrap();
        engine.shutdown().await.unwrap();
        engine.shutdown().await.unwrap();

        let err = engine
            .execute("SELECT 1", &[], ExecMode::First)
            .await
            .unwrap_err();
        assert!(err.is_fatal());

        // The file is free for the next owner.
        let next = StorageEngine::new(config_in(&dir));
        next.initialize().await.unwrap();
        next.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn statement_errors_do_not_poison() {
        let engine = StorageEngine::from_database(Database::open_in_memory().await.unwrap());
        let err = engine
            .execute("NOT SQL", &[], ExecMode::Run)
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::Statement { .. }));
        engine.execute("SELECT 1", &[], ExecMode::Run).await.unwrap();
    }

    #[tokio::test]
    async fn dead_engine_thread_signals_failure() {
        let engine = StorageEngine::from_database(Database::open_in_memory().await.unwrap());
        let token = engine.failure_token();
        assert!(!token.is_cancelled());

        // Stop the storage thread behind the engine's back.
        engine.database().unwrap().close().await.unwrap();
        let err = engine
            .execute("SELECT 1", &[], ExecMode::First)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(token.is_cancelled());

        match engine.failed().await {
            HearthError::EngineUnavailable { reason } => {
                assert_eq!(reason, "storage thread has stopped");
            }
            other => panic!("expected engine failure, got {other:?}"),
        }
        assert!(engine.database().is_err());
    }

    #[tokio::test]
    async fn clean_shutdown_is_not_a_failure() {
        let dir = tempdir().unwrap();
        let engine = StorageEngine::new(config_in(&dir));
        engine.initialize().await.unwrap();
        engine.shutdown().await.unwrap();
        assert!(!engine.failure_token().is_cancelled());
    }
}
