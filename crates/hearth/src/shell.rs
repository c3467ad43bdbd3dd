// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth shell` command implementation.
//!
//! Interactive SQL session over the façade with readline history. Lines
//! starting with `/` are shell commands; anything else is a statement run
//! in the current mode. When the owner stops answering, the shell tears its
//! actor down and elects again before the next statement.

use std::str::FromStr;

use colored::Colorize;
use hearth_config::HearthConfig;
use hearth_coordinator::Coordinator;
use hearth_core::{ExecMode, HearthError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::exec::execute;
use crate::serve::init_tracing;

/// A parsed input line.
#[derive(Debug, PartialEq)]
enum ShellInput<'a> {
    Quit,
    Help,
    Status,
    Reset,
    Mode(Option<&'a str>),
    Unknown(&'a str),
    Sql(&'a str),
}

fn parse_line(line: &str) -> ShellInput<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return ShellInput::Sql(line);
    };
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" => ShellInput::Quit,
        "help" => ShellInput::Help,
        "status" => ShellInput::Status,
        "reset" => ShellInput::Reset,
        "mode" => ShellInput::Mode(parts.next()),
        _ => ShellInput::Unknown(line),
    }
}

fn print_help() {
    println!("  {}  run in first, all, or run mode", "/mode <m>".yellow());
    println!("  {}    role and unsynced change count", "/status".yellow());
    println!("  {}     clear the unsynced change count", "/reset".yellow());
    println!("  {}      leave the shell", "/quit".yellow());
}

/// Runs the `hearth shell` interactive REPL.
pub async fn run_shell(config: HearthConfig) -> Result<(), HearthError> {
    init_tracing(&config.actor.log_level);

    let mut coordinator = Coordinator::from_config(&config).await?;
    let mut mode = ExecMode::All;

    let mut rl = DefaultEditor::new()
        .map_err(|e| HearthError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "hearth shell".bold().green());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    loop {
        if coordinator.is_restart_requested() {
            coordinator.shutdown().await?;
            tokio::time::sleep(config.election.reelection_delay()).await;
            coordinator = Coordinator::from_config(&config).await?;
            info!(role = %coordinator.role(), "re-elected");
        }

        let prompt = format!("{}:{}> ", "hearth".green(), coordinator.role().to_string().cyan());
        let line = tokio::task::block_in_place(|| rl.readline(&prompt));
        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match parse_line(trimmed) {
                    ShellInput::Quit => break,
                    ShellInput::Help => print_help(),
                    ShellInput::Status => {
                        let status = coordinator.status();
                        println!(
                            "role: {}  mode: {mode}  unsynced changes: {}",
                            status.role.to_string().cyan(),
                            status.mutations
                        );
                    }
                    ShellInput::Reset => {
                        coordinator.reset_mutation_count();
                        println!("{}", "unsynced change count cleared".dimmed());
                    }
                    ShellInput::Mode(None) => println!("mode: {mode}"),
                    ShellInput::Mode(Some(name)) => match ExecMode::from_str(name) {
                        Ok(next) => mode = next,
                        Err(_) => eprintln!("{}: unknown mode `{name}`", "error".red()),
                    },
                    ShellInput::Unknown(cmd) => {
                        eprintln!("{}: unknown command `{cmd}`", "error".red());
                    }
                    ShellInput::Sql(sql) => {
                        match execute(coordinator.facade(), sql, Vec::new(), mode).await {
                            Ok(output) => println!(
                                "{}",
                                serde_json::to_string_pretty(&output)
                                    .unwrap_or_else(|_| "null".to_string())
                            ),
                            // A proxy told of a dead owner engine re-elects instead.
                            Err(e) if e.is_fatal() && !coordinator.is_restart_requested() => {
                                eprintln!("{}: {e}", "fatal".red().bold());
                                break;
                            }
                            Err(e) => {
                                if e.requires_reelection() || coordinator.is_restart_requested() {
                                    warn!(error = %e, "owner unreachable, will re-elect");
                                }
                                eprintln!("{}: {e}", "error".red());
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    let mutations = coordinator.mutation_count();
    coordinator.shutdown().await?;
    if mutations > 0 {
        println!("{}", format!("{mutations} unsynced changes").dimmed());
    }
    Ok(())
}
