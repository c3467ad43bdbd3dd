// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth status` command implementation.
//!
//! Checks the election lock to tell whether an owner is alive. Never joins
//! the election itself, so running it cannot change who owns the store.

use std::io::IsTerminal;

use hearth_config::HearthConfig;
use hearth_coordinator::FileLock;
use hearth_core::HearthError;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub owner_alive: bool,
    pub lock_path: String,
    pub database_path: String,
    pub channel: String,
}

/// Inspect the lock named in `config`.
pub fn inspect(config: &HearthConfig) -> Result<StatusResponse, HearthError> {
    let lock = FileLock::from_config(&config.election);
    Ok(StatusResponse {
        owner_alive: lock.is_held()?,
        lock_path: lock.path().display().to_string(),
        database_path: config.storage.database_path.clone(),
        channel: config.bus.channel_name.clone(),
    })
}

/// Run the `hearth status` command.
pub fn run_status(config: &HearthConfig, json: bool) -> Result<(), HearthError> {
    let status = inspect(config)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_status(&status, std::io::stdout().is_terminal());
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  hearth status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        if status.owner_alive {
            println!("    Owner:    {} {}", "✓".green(), "running".green());
        } else {
            println!("    Owner:    {} {}", "✗".red(), "none".red());
        }
    } else if status.owner_alive {
        println!("    Owner:    [OK] running");
    } else {
        println!("    Owner:    [--] none");
    }
    println!("    Store:    {}", status.database_path);
    println!("    Lock:     {}", status.lock_path);
    println!("    Channel:  {}", status.channel);
    println!();
}
