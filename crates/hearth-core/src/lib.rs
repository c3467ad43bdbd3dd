// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Hearth coordination layer.
//!
//! Hearth lets many local actors share one embedded SQLite store: one actor
//! wins a host-wide lock and owns the store, the rest proxy their statements
//! to it over a broadcast bus. This crate holds the error type, the wire
//! messages, and the traits every other crate plugs into.

pub mod error;
pub mod protocol;
pub mod traits;
pub mod types;

pub use error::HearthError;
pub use protocol::{BusMessage, FailureKind, QueryRequest, QueryResponse};
pub use traits::{BusReceiver, LockLease, MessageBus, NamedLock, StatementExecutor};
pub use types::{ActorState, ExecMode, ExecOutcome, HealthStatus, RequesterId, Role, Row};
