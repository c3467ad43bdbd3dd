// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations using refinery.
//!
//! The migrations create the schema and seed baseline rows. Refinery records
//! what it applied in `refinery_schema_history`, so a fresh store is seeded
//! exactly once and an existing store is left as it was.

use hearth_core::HearthError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Value the counter row is seeded with on a fresh store.
pub const SEED_COUNTER_VALUE: i64 = 42;

/// Run all pending migrations, returning how many were applied.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, HearthError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| HearthError::Storage {
            source: Box::new(e),
        })?;
    let applied = report.applied_migrations().len();
    if applied > 0 {
        info!(applied, "schema migrations applied");
    }
    Ok(applied)
}
