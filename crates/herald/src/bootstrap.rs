// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration, registry, storage, and transports into a dispatcher.

use std::sync::Arc;

use herald_config::{HeraldConfig, Settings};
use herald_core::HeraldError;
use herald_dispatch::Dispatcher;
use herald_handlers::{FileTemplateRenderer, builtin_catalog, transports_from_config};
use herald_registry::{HandlerRegistry, initialize_registry};
use herald_storage::{SqliteStore, SqliteTaskQueue};
use tracing::info;

/// Everything a command needs.
pub struct App {
    pub config: HeraldConfig,
    pub registry: Arc<HandlerRegistry>,
    pub store: Arc<SqliteStore>,
    pub queue: Arc<SqliteTaskQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

/// Builds the handler registry from the `handlers` setting.
pub fn registry(config: &HeraldConfig) -> Result<(Arc<Settings>, HandlerRegistry), HeraldError> {
    let settings = Arc::new(Settings::new(config.msg.clone()));
    let registry = initialize_registry(&settings, &builtin_catalog())?;
    Ok((settings, registry))
}

/// Opens storage and assembles the dispatcher. Any failure aborts startup.
pub async fn bootstrap(config: HeraldConfig) -> Result<App, HeraldError> {
    let (settings, registry) = registry(&config)?;
    let registry = Arc::new(registry);

    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    let store = Arc::new(store);
    let queue = Arc::new(SqliteTaskQueue::new(
        store.database()?.clone(),
        config.worker.queue_name.clone(),
    ));

    let transports = transports_from_config(&config)?;
    let renderer = Arc::new(FileTemplateRenderer::new(config.templates.dir.clone()));

    let dispatcher = Dispatcher::builder(Arc::clone(&registry), store.clone(), settings, renderer)
        .queue(queue.clone())
        .transports(transports)
        .build();

    info!(
        handlers = registry.len(),
        database = %config.storage.database_path,
        "herald initialized"
    );

    Ok(App {
        config,
        registry,
        store,
        queue,
        dispatcher: Arc::new(dispatcher),
    })
}
