// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exclusive database handle running on a dedicated thread.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, so no two statements interleave on the connection. The file is
//! opened in `EXCLUSIVE` locking mode and the lock is taken during open: a
//! second engine pointed at the same file fails with
//! [`HearthError::StoreLocked`] instead of waiting.

use std::path::Path;
use std::time::Duration;

use hearth_config::model::StorageConfig;
use hearth_core::{ExecMode, ExecOutcome, HearthError};
use rusqlite::ErrorCode;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use tracing::{debug, info};

use crate::migrations;
use crate::value;

/// Handle to the backing store. Cheap to clone; clones share the thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (creating if needed) the store at `config.database_path`.
    ///
    /// A missing file is created, migrated, and seeded. An existing file is
    /// loaded unchanged apart from migrations it has not seen yet.
    pub async fn open(config: &StorageConfig) -> Result<Self, HearthError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| HearthError::Storage {
                source: Box::new(e),
            })?;
        }
        let fresh = !Path::new(&path).exists();

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| HearthError::Storage {
                source: Box::new(e),
            })?;

        let wal_mode = config.wal_mode;
        let lock_path = path.clone();
        let applied = conn
            .call(move |conn| -> Result<usize, HearthError> {
                take_exclusive(conn, wal_mode).map_err(|e| classify_open_error(e, &lock_path))?;
                migrations::run_migrations(conn)
            })
            .await
            .map_err(map_call_err)?;

        info!(path = %path, fresh, applied, wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// Open a private in-memory store with the same schema and seed rows.
    pub async fn open_in_memory() -> Result<Self, HearthError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| HearthError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<usize, HearthError> { migrations::run_migrations(conn) })
            .await
            .map_err(map_call_err)?;
        Ok(Self {
            conn,
            path: ":memory:".to_string(),
        })
    }

    /// Path of the backing file (`:memory:` for in-memory stores).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Execute `sql` in the requested mode.
    ///
    /// The text may hold several `;`-separated statements; they run in order
    /// and their rows are returned in order (`first` keeps only the very
    /// first row). `changes` is the number of rows the last statement
    /// modified, and zero when that statement did not write.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        mode: ExecMode,
    ) -> Result<ExecOutcome, HearthError> {
        let sql = sql.to_string();
        let params: Vec<SqlValue> = params.iter().map(value::to_sql).collect();
        debug!(mode = %mode, params = params.len(), "executing statement");
        self.conn
            .call(move |conn| run_statement(conn, &sql, &params, mode))
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL and stop the background thread, releasing the file.
    ///
    /// Later calls on any clone fail with [`HearthError::EngineUnavailable`].
    pub async fn close(&self) -> Result<(), HearthError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(()),
                        other => Err(other),
                    })
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.clone().close().await.map_err(map_tr_err)?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Apply connection settings and take the file lock immediately.
fn take_exclusive(conn: &rusqlite::Connection, wal_mode: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::ZERO)?;
    conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |row| {
        row.get::<_, String>(0)
    })?;
    if wal_mode {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    // In exclusive locking mode the lock taken here is never given back
    // until the connection closes.
    conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")?;
    Ok(())
}

/// Run every statement in `sql`, in order, collecting rows as they come.
///
/// Statements without placeholders run unbound; the rest all receive
/// `params`. `changes` describes the last statement: zero unless it wrote.
fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[SqlValue],
    mode: ExecMode,
) -> rusqlite::Result<ExecOutcome> {
    let mut out = Vec::new();
    let mut changes = 0;

    let mut batch = rusqlite::Batch::new(conn, sql);
    while let Some(mut stmt) = batch.next()? {
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let bound = if stmt.parameter_count() == 0 { &[][..] } else { params };
        let before = total_changes(conn)?;
        {
            let mut rows = stmt.query(rusqlite::params_from_iter(bound.iter()))?;
            // Stepping to completion applies the statement; `run` keeps no rows.
            while let Some(row) = rows.next()? {
                match mode {
                    ExecMode::Run => {}
                    ExecMode::All => out.push(value::row_to_map(row, &columns)?),
                    ExecMode::First => {
                        if out.is_empty() {
                            out.push(value::row_to_map(row, &columns)?);
                        }
                        break;
                    }
                }
            }
        }
        drop(stmt);
        // `changes()` keeps the count of the last write, so only trust it
        // when this statement moved the connection total.
        changes = if total_changes(conn)? == before {
            0
        } else {
            conn.changes()
        };
    }

    Ok(ExecOutcome { rows: out, changes })
}

fn total_changes(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}

fn is_lock_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn classify_open_error(err: rusqlite::Error, path: &str) -> HearthError {
    if is_lock_conflict(&err) {
        HearthError::StoreLocked {
            path: path.to_string(),
        }
    } else {
        HearthError::Storage {
            source: Box::new(err),
        }
    }
}

/// Convert a tokio-rusqlite error from a statement call.
///
/// SQLite errors belong to the statement; a closed connection means the
/// engine thread is gone for good.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HearthError {
    match e {
        tokio_rusqlite::Error::Error(err) => HearthError::Statement {
            message: err.to_string(),
        },
        tokio_rusqlite::Error::ConnectionClosed => engine_gone(),
        other => HearthError::Storage {
            source: other.to_string().into(),
        },
    }
}

fn map_call_err(e: tokio_rusqlite::Error<HearthError>) -> HearthError {
    match e {
        tokio_rusqlite::Error::Error(err) => err,
        tokio_rusqlite::Error::ConnectionClosed => engine_gone(),
        other => HearthError::Storage {
            source: other.to_string().into(),
        },
    }
}

fn engine_gone() -> HearthError {
    HearthError::EngineUnavailable {
        reason: "storage thread has stopped".to_string(),
    }
}
