// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-independent query façade.
//!
//! Business logic prepares and runs statements through [`Facade`] without
//! knowing whether the executor behind it is the local storage engine or a
//! bus round trip to the owner.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use hearth_core::{ExecMode, ExecOutcome, HearthError, Row, StatementExecutor};

use crate::tracker::MutationTracker;

/// Execution metadata returned with every `all()` and `run()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryMeta {
    pub changes: u64,
    pub rows_read: usize,
    pub duration_ms: f64,
}

/// Result of [`BoundStatement::all`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub results: Vec<T>,
    pub success: bool,
    pub meta: QueryMeta,
}

/// Result of [`BoundStatement::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub meta: QueryMeta,
}

/// Entry point for statements. Cheap to clone.
#[derive(Clone)]
pub struct Facade {
    executor: Arc<dyn StatementExecutor>,
    tracker: Arc<MutationTracker>,
}

impl Facade {
    pub fn new(executor: Arc<dyn StatementExecutor>, tracker: Arc<MutationTracker>) -> Self {
        Self { executor, tracker }
    }

    pub fn prepare(&self, sql: impl Into<String>) -> Statement {
        Statement {
            inner: BoundStatement {
                facade: self.clone(),
                sql: sql.into(),
                params: Vec::new(),
            },
        }
    }

    pub fn tracker(&self) -> &Arc<MutationTracker> {
        &self.tracker
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        mode: ExecMode,
    ) -> Result<(ExecOutcome, f64), HearthError> {
        let started = Instant::now();
        let outcome = self.executor.execute(sql, params, mode).await?;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        // Only confirmed statements count toward unsynced changes.
        let counted = self.tracker.observe(sql);
        debug!(mode = %mode, rows = outcome.rows.len(), changes = outcome.changes, counted, "statement complete");
        Ok((outcome, duration_ms))
    }
}

/// A prepared statement with no parameters bound.
#[derive(Clone)]
pub struct Statement {
    inner: BoundStatement,
}

impl Statement {
    /// Bind positional parameters, replacing any bound before.
    pub fn bind<I, V>(&self, params: I) -> BoundStatement
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        BoundStatement {
            facade: self.inner.facade.clone(),
            sql: self.inner.sql.clone(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn first<T: DeserializeOwned>(&self) -> Result<Option<T>, HearthError> {
        self.inner.first().await
    }

    pub async fn all<T: DeserializeOwned>(&self) -> Result<QueryResult<T>, HearthError> {
        self.inner.all().await
    }

    pub async fn run(&self) -> Result<RunResult, HearthError> {
        self.inner.run().await
    }

    pub fn sql(&self) -> &str {
        &self.inner.sql
    }
}

/// A statement with its parameters, ready to execute.
#[derive(Clone)]
pub struct BoundStatement {
    facade: Facade,
    sql: String,
    params: Vec<Value>,
}

impl BoundStatement {
    /// First row decoded as `T`, or `None` when the statement returns nothing.
    pub async fn first<T: DeserializeOwned>(&self) -> Result<Option<T>, HearthError> {
        let (outcome, _) = self
            .facade
            .execute(&self.sql, &self.params, ExecMode::First)
            .await?;
        outcome.rows.into_iter().next().map(decode_row).transpose()
    }

    /// Every row decoded as `T`.
    pub async fn all<T: DeserializeOwned>(&self) -> Result<QueryResult<T>, HearthError> {
        let (outcome, duration_ms) = self
            .facade
            .execute(&self.sql, &self.params, ExecMode::All)
            .await?;
        let rows_read = outcome.rows.len();
        let results = outcome
            .rows
            .into_iter()
            .map(decode_row)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(QueryResult {
            results,
            success: true,
            meta: QueryMeta {
                changes: outcome.changes,
                rows_read,
                duration_ms,
            },
        })
    }

    /// Apply the statement, discarding any rows.
    pub async fn run(&self) -> Result<RunResult, HearthError> {
        let (outcome, duration_ms) = self
            .facade
            .execute(&self.sql, &self.params, ExecMode::Run)
            .await?;
        Ok(RunResult {
            success: true,
            meta: QueryMeta {
                changes: outcome.changes,
                rows_read: 0,
                duration_ms,
            },
        })
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, HearthError> {
    serde_json::from_value(Value::Object(row)).map_err(|source| HearthError::Decode { source })
}
