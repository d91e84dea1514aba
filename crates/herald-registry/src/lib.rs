// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler registry for Herald.
//!
//! Provides the [`HandlerRegistry`] that enforces name uniqueness and required
//! fields, the request-scoped [`HandlerResolver`], and the [`HandlerCatalog`]
//! that turns import strings into handler instances.

pub mod catalog;
pub mod registry;
pub mod resolver;

use herald_config::Settings;
use herald_core::{HandlerImporter, HeraldError};
use tracing::info;

pub use catalog::HandlerCatalog;
pub use registry::{HandlerRegistry, RegisteredHandler};
pub use resolver::HandlerResolver;

/// Builds the registry from the `handlers` setting.
///
/// Called once at startup. Any import or registration failure aborts it.
pub fn initialize_registry(
    settings: &Settings,
    importer: &dyn HandlerImporter,
) -> Result<HandlerRegistry, HeraldError> {
    let mut registry = HandlerRegistry::new();
    for handler in settings.handlers(importer)? {
        registry.register(handler)?;
    }
    info!(count = registry.len(), "handler registry initialized");
    Ok(registry)
}
