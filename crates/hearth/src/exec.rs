// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth exec` command implementation.
//!
//! Elects, runs one statement through the façade, prints the result as
//! JSON on stdout, and shuts down. If no owner is alive this process
//! becomes the owner for the duration of the call.

use hearth_config::HearthConfig;
use hearth_coordinator::{Coordinator, Facade};
use hearth_core::{ExecMode, HearthError};
use serde_json::Value;

use crate::serve::init_tracing;

/// Runs the `hearth exec` command.
pub async fn run_exec(
    config: HearthConfig,
    sql: &str,
    params: &[String],
    mode: ExecMode,
) -> Result<(), HearthError> {
    init_tracing(&config.actor.log_level);

    let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
    let coordinator = Coordinator::from_config(&config).await?;
    eprintln!("role: {}", coordinator.role());

    let result = execute(coordinator.facade(), sql, params, mode).await;
    coordinator.shutdown().await?;

    let output = result?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "null".to_string())
    );
    Ok(())
}

/// Run `sql` in `mode` and render the façade's answer as JSON.
///
/// `first` yields the row or `null`; `all` and `run` yield the full result
/// object with its `meta`.
pub(crate) async fn execute(
    facade: &Facade,
    sql: &str,
    params: Vec<Value>,
    mode: ExecMode,
) -> Result<Value, HearthError> {
    let statement = facade.prepare(sql).bind(params);
    let rendered = match mode {
        ExecMode::First => serde_json::to_value(statement.first::<Value>().await?),
        ExecMode::All => serde_json::to_value(statement.all::<Value>().await?),
        ExecMode::Run => serde_json::to_value(statement.run().await?),
    };
    rendered.map_err(|source| HearthError::Decode { source })
}

/// Parse a `--param` argument as JSON, falling back to a plain string.
pub(crate) fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
