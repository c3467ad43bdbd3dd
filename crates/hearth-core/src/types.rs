// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the elector, storage engine, bus, and façade.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A result row: column name to value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The role an actor resolved to at election time.
///
/// Fixed for the actor's lifetime; changing roles means tearing the actor
/// down and electing again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Holds the election lock and the only storage engine.
    Owner,
    /// Forwards every statement to the owner over the bus.
    Proxy,
}

/// How the storage engine should execute a statement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    /// Return at most one row, stopping after the first.
    First,
    /// Materialize the full result set.
    All,
    /// Apply the statement and report only the change count.
    Run,
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecOutcome {
    /// Rows produced, empty for [`ExecMode::Run`].
    pub rows: Vec<Row>,
    /// Rows changed by the most recent INSERT/UPDATE/DELETE on the connection.
    pub changes: u64,
}

/// Opaque identifier of a proxy actor on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub String);

impl RequesterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of one actor, from startup to teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "role", rename_all = "lowercase")]
pub enum ActorState {
    /// Election not yet run.
    Unelected,
    /// Owner elected, storage engine opening.
    Initializing,
    /// Accepting statements in the given role.
    Serving(Role),
    /// Torn down; the lock (if held) is released.
    Terminated,
}

/// Health status reported by the storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}
