// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiled-in handler factories addressed by import strings.
//!
//! The `msg.handlers` setting lists import strings such as
//! `builtin::account-created`. Each names a factory added to a
//! [`HandlerCatalog`] at build time; nothing is loaded dynamically.

use std::sync::Arc;

use herald_config::diagnostic::suggest_key;
use herald_core::{Handler, HandlerImporter, HeraldError};
use indexmap::IndexMap;

type Factory = Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

/// Separator between the module and handler parts of an import string.
pub const PATH_SEPARATOR: &str = "::";

/// Import-string to handler-factory catalog.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    factories: IndexMap<String, Factory>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory under `path`. A later entry with the same path replaces it.
    pub fn with<F>(mut self, path: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.factories.insert(path.into(), Arc::new(factory));
        self
    }

    /// Merges another catalog's entries into this one.
    pub fn extend(mut self, other: HandlerCatalog) -> Self {
        self.factories.extend(other.factories);
        self
    }

    /// Import strings in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl HandlerImporter for HandlerCatalog {
    fn import(&self, path: &str) -> Result<Arc<dyn Handler>, HeraldError> {
        if !path.contains(PATH_SEPARATOR) {
            return Err(HeraldError::Config(format!(
                "handler import string `{path}` must look like `module{PATH_SEPARATOR}handler`"
            )));
        }

        match self.factories.get(path) {
            Some(factory) => Ok(factory()),
            None => {
                let known: Vec<&str> = self.paths().collect();
                let hint = suggest_key(path, &known)
                    .map(|s| format!("; did you mean `{s}`?"))
                    .unwrap_or_default();
                Err(HeraldError::Config(format!(
                    "unknown handler `{path}`{hint}"
                )))
            }
        }
    }
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
