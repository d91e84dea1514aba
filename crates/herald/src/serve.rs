// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Bootstraps the dispatcher and drains the dispatch queue until SIGINT or
//! SIGTERM. The WAL is checkpointed on the way out.

use std::time::Duration;

use herald_config::HeraldConfig;
use herald_core::HeraldError;
use herald_dispatch::{QueueWorker, install_signal_handler};
use tracing::info;

use crate::bootstrap::bootstrap;

/// Runs the `herald serve` command.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    info!("starting herald serve");

    let app = bootstrap(config).await?;
    let pending = app.queue.pending().await?;
    info!(
        queue = app.queue.queue_name(),
        pending,
        handlers = ?app.registry.names(),
        "dispatch queue ready"
    );

    let worker = QueueWorker::new(
        app.dispatcher.clone(),
        app.queue.clone(),
        Duration::from_millis(app.config.worker.poll_interval_ms),
    );
    let cancel = install_signal_handler();
    worker.run(cancel).await?;

    app.store.close().await?;
    info!("herald stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence. Output goes to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
