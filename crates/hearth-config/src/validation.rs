// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Lock and channel names become file names shared by every actor on the
//! host, so they are restricted to a portable character set.

use crate::diagnostic::ConfigError;
use crate::model::HearthConfig;

/// Upper bound for the proxy round-trip timeout (ten minutes).
const MAX_QUERY_TIMEOUT_MS: u64 = 600_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &HearthConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.actor.log_level.as_str()) {
        errors.push(invalid(
            "actor.log_level",
            format!(
                "`{}` is not one of: {}",
                config.actor.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    for (key, value) in [
        ("storage.database_path", &config.storage.database_path),
        ("election.lock_dir", &config.election.lock_dir),
        ("bus.directory", &config.bus.directory),
    ] {
        if value.trim().is_empty() {
            errors.push(invalid(key, "must not be empty"));
        }
    }

    for (key, value) in [
        ("election.lock_name", &config.election.lock_name),
        ("bus.channel_name", &config.bus.channel_name),
    ] {
        if let Some(reason) = check_identifier(value) {
            errors.push(invalid(key, reason));
        }
    }

    if config.bus.query_timeout_ms == 0 || config.bus.query_timeout_ms > MAX_QUERY_TIMEOUT_MS {
        errors.push(invalid(
            "bus.query_timeout_ms",
            format!(
                "must be between 1 and {MAX_QUERY_TIMEOUT_MS}, got {}",
                config.bus.query_timeout_ms
            ),
        ));
    }

    if config.bus.local_capacity == 0 {
        errors.push(invalid("bus.local_capacity", "must be at least 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn check_identifier(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some("must not be empty".to_string());
    }
    if value.starts_with('.') {
        return Some(format!("`{value}` must not start with `.`"));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Some(format!(
            "`{value}` may only contain ASCII letters, digits, `.`, `_` or `-`"
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidValue { key, .. } if key == needle))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&HearthConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = HearthConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "storage.database_path"));
    }

    #[test]
    fn lock_name_with_slash_fails_validation() {
        let mut config = HearthConfig::default();
        config.election.lock_name = "../escape".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "election.lock_name"));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = HearthConfig::default();
        config.bus.query_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "bus.query_timeout_ms"));
    }

    #[test]
    fn collects_every_failure() {
        let mut config = HearthConfig::default();
        config.actor.log_level = "loud".to_string();
        config.bus.channel_name = String::new();
        config.bus.query_timeout_ms = MAX_QUERY_TIMEOUT_MS + 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
