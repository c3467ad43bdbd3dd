// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Hearth coordination layer.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Hearth traits and core operations.
#[derive(Debug, Error)]
pub enum HearthError {
    /// Configuration errors (invalid TOML, bad paths, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (opening the file, pragmas, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backing store is already held by another storage engine.
    ///
    /// Two engines on one file means two owners, which the election rules out.
    /// Treated as a fatal configuration error, never retried.
    #[error("database `{path}` is locked by another storage engine")]
    StoreLocked { path: String },

    /// The storage engine failed to start or its execution context is gone.
    /// Every pending and future call in this actor fails with this error.
    #[error("storage engine unavailable: {reason}")]
    EngineUnavailable { reason: String },

    /// A single statement failed (bad SQL, constraint violation, bad params).
    #[error("statement failed: {message}")]
    Statement { message: String },

    /// No response from the owner within the round-trip timeout.
    #[error("leader unreachable: no response within {timeout:?}")]
    LeaderUnreachable { timeout: Duration },

    /// Message bus errors (socket I/O, encoding, closed channel).
    #[error("bus error: {message}")]
    Bus {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The election lock could not be created or inspected.
    ///
    /// Contention is not an error; it resolves to the proxy role.
    #[error("lock `{name}` unusable: {source}")]
    Lock {
        name: String,
        source: std::io::Error,
    },

    /// A result row could not be decoded into the requested type.
    #[error("row decode failed: {source}")]
    Decode { source: serde_json::Error },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Shorthand for a bus error without an underlying source.
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is terminal for the actor that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StoreLocked { .. } | Self::EngineUnavailable { .. }
        )
    }

    /// Whether recovering from this error requires tearing the actor down
    /// and running a fresh election.
    pub fn requires_reelection(&self) -> bool {
        matches!(self, Self::LeaderUnreachable { .. })
    }
}
