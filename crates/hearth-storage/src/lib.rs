// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Hearth coordination layer.
//!
//! Provides an exclusive, WAL-mode SQLite store with embedded migrations and
//! a single-thread execution model via `tokio-rusqlite`. Only the elected
//! owner opens it.

pub mod database;
pub mod engine;
pub mod migrations;
pub mod value;

pub use database::Database;
pub use engine::StorageEngine;
pub use migrations::SEED_COUNTER_VALUE;
