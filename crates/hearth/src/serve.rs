// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth serve` command implementation.
//!
//! Joins the election and keeps an actor alive until SIGINT or SIGTERM.
//! An owner answers proxies on the bus for as long as it runs; a proxy
//! re-elects whenever its owner goes silent.

use hearth_config::HearthConfig;
use hearth_coordinator::Supervisor;
use hearth_coordinator::shutdown::install_signal_handler;
use hearth_core::HearthError;
use tracing::info;

/// Runs the `hearth serve` command.
pub async fn run_serve(config: HearthConfig) -> Result<(), HearthError> {
    init_tracing(&config.actor.log_level);

    info!(
        store = %config.storage.database_path,
        channel = %config.bus.channel_name,
        "hearth serving"
    );

    let shutdown = install_signal_handler();
    let supervisor = Supervisor::from_config(config);
    supervisor
        .run(shutdown, |coordinator| {
            info!(
                role = %coordinator.role(),
                requester_id = ?coordinator.requester_id(),
                "role assigned"
            );
        })
        .await?;

    info!("hearth stopped");
    Ok(())
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so
/// command results on stdout stay machine-readable.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hearth={log_level},warn")));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
