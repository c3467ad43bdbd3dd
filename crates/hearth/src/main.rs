// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hearth - share one local SQLite store between many processes.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod exec;
mod serve;
mod shell;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hearth_config::HearthConfig;
use hearth_core::ExecMode;

/// Hearth - share one local SQLite store between many processes.
#[derive(Parser, Debug)]
#[command(name = "hearth", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Join the election and keep serving until interrupted.
    Serve,
    /// Run one statement and print the result as JSON.
    Exec {
        /// Statement text.
        sql: String,
        /// Positional parameter as JSON (bare words are taken as strings).
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
        /// Execution mode.
        #[arg(long, default_value = "all")]
        mode: ExecMode,
    },
    /// Launch an interactive SQL session.
    Shell,
    /// Report whether an owner currently holds the store.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> HearthConfig {
    let loaded = match path {
        Some(path) => hearth_config::load_and_validate_path(path),
        None => hearth_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            hearth_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Exec { sql, params, mode }) => {
            exec::run_exec(config, &sql, &params, mode).await
        }
        Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json),
        None => {
            println!("hearth: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
