// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Hearth coordination layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Hearth configuration.
///
/// Every actor on a host must agree on `election.lock_name`,
/// `election.lock_dir`, `bus.channel_name`, and `bus.directory`, or they
/// will not see each other.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HearthConfig {
    /// Per-actor settings.
    #[serde(default)]
    pub actor: ActorConfig,

    /// Backing store settings (owner only).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Election lock settings.
    #[serde(default)]
    pub election: ElectionConfig,

    /// Message bus settings.
    #[serde(default)]
    pub bus: BusConfig,
}

/// Per-actor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActorConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("hearth").join("local.db"))
        .unwrap_or_else(|| PathBuf::from("hearth.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Election configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ElectionConfig {
    /// Host-wide lock name. The lock file is `<lock_dir>/<lock_name>.lock`.
    #[serde(default = "default_lock_name")]
    pub lock_name: String,

    /// Directory holding lock files.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: String,

    /// Pause before re-running the election after a leader timeout.
    #[serde(default = "default_reelection_delay_ms")]
    pub reelection_delay_ms: u64,
}

impl ElectionConfig {
    pub fn reelection_delay(&self) -> Duration {
        Duration::from_millis(self.reelection_delay_ms)
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            lock_name: default_lock_name(),
            lock_dir: default_lock_dir(),
            reelection_delay_ms: default_reelection_delay_ms(),
        }
    }
}

fn default_lock_name() -> String {
    "hearth-leader".to_string()
}

fn default_lock_dir() -> String {
    runtime_base().display().to_string()
}

fn default_reelection_delay_ms() -> u64 {
    250
}

/// Message bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Channel name shared by all actors.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Directory holding subscriber sockets, one subdirectory per channel.
    #[serde(default = "default_bus_directory")]
    pub directory: String,

    /// Round-trip timeout for proxied statements.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Buffered messages per subscriber for the in-process bus.
    #[serde(default = "default_local_capacity")]
    pub local_capacity: usize,
}

impl BusConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            directory: default_bus_directory(),
            query_timeout_ms: default_query_timeout_ms(),
            local_capacity: default_local_capacity(),
        }
    }
}

fn default_channel_name() -> String {
    "hearth-db".to_string()
}

fn default_bus_directory() -> String {
    runtime_base().join("bus").display().to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_local_capacity() -> usize {
    256
}

/// Per-user runtime directory, falling back to the system temp dir.
fn runtime_base() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hearth")
}
