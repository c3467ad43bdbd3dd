// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hearth.toml` > `~/.config/hearth/hearth.toml` > `/etc/hearth/hearth.toml`
//! with environment variable overrides via `HEARTH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HearthConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/hearth/hearth.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "hearth.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hearth/hearth.toml` (system-wide)
/// 3. `~/.config/hearth/hearth.toml` (user XDG config)
/// 4. `./hearth.toml` (local directory)
/// 5. `HEARTH_*` environment variables
pub fn load_config() -> Result<HearthConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HearthConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HearthConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("hearth").join(LOCAL_CONFIG))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `HEARTH_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `HEARTH_BUS_QUERY_TIMEOUT_MS` must become
/// `bus.query_timeout_ms`, not `bus.query.timeout.ms`.
fn env_provider() -> Env {
    Env::prefixed("HEARTH_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("actor_", "actor.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("election_", "election.", 1)
            .replacen("bus_", "bus.", 1);
        mapped.into()
    })
}
