// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime settings resolved from the `[msg]` section.
//!
//! Primary keys (`async`, `handlers`, `default_lang`) are fixed once the
//! resolver is built. Extra keys (`skip_send`) can be overridden at runtime.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use herald_core::{Handler, HandlerImporter, HeraldError};
use tracing::{debug, info};

use crate::diagnostic::ConfigError;
use crate::model::MsgConfig;

/// Keys resolved from user configuration with compiled defaults.
pub const PRIMARY_KEYS: &[&str] = &["async", "handlers", "default_lang"];

/// Keys that may be overridden after startup.
pub const EXTRA_KEYS: &[&str] = &["skip_send"];

/// A resolved setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy)]
struct Extras {
    skip_send: bool,
}

/// Settings resolver shared by the registry bootstrap and the dispatcher.
pub struct Settings {
    msg: MsgConfig,
    extras: ArcSwap<Extras>,
    handlers: OnceLock<Vec<Arc<dyn Handler>>>,
}

impl Settings {
    pub fn new(msg: MsgConfig) -> Self {
        let extras = Extras {
            skip_send: msg.skip_send,
        };
        Self {
            msg,
            extras: ArcSwap::from_pointee(extras),
            handlers: OnceLock::new(),
        }
    }

    /// Looks up a setting by key.
    ///
    /// Unknown keys fail with [`ConfigError::UnknownSetting`], suggesting the
    /// closest known key.
    pub fn value(&self, key: &str) -> Result<SettingValue, ConfigError> {
        match key {
            "async" => Ok(SettingValue::Bool(self.dispatch_async())),
            "handlers" => Ok(SettingValue::List(self.msg.handlers.clone())),
            "default_lang" => Ok(SettingValue::Text(self.msg.default_lang.clone())),
            "skip_send" => Ok(SettingValue::Bool(self.skip_send())),
            _ => {
                let known: Vec<&str> = PRIMARY_KEYS.iter().chain(EXTRA_KEYS).copied().collect();
                Err(ConfigError::unknown_setting(key, &known))
            }
        }
    }

    /// Whether dispatch defaults to the queued path.
    pub fn dispatch_async(&self) -> bool {
        self.msg.dispatch_async
    }

    pub fn default_lang(&self) -> &str {
        &self.msg.default_lang
    }

    /// Import strings from the `handlers` key.
    pub fn handler_paths(&self) -> &[String] {
        &self.msg.handlers
    }

    pub fn skip_send(&self) -> bool {
        self.extras.load().skip_send
    }

    /// Overrides `skip_send` without a restart.
    pub fn set_skip_send(&self, skip_send: bool) {
        info!(skip_send, "skip_send overridden");
        self.extras.store(Arc::new(Extras { skip_send }));
    }

    /// Resolves the `handlers` import strings into handler instances.
    ///
    /// The list is built on first success and cached for the lifetime of
    /// the resolver; later calls ignore `importer`.
    pub fn handlers(
        &self,
        importer: &dyn HandlerImporter,
    ) -> Result<Vec<Arc<dyn Handler>>, HeraldError> {
        if let Some(cached) = self.handlers.get() {
            return Ok(cached.clone());
        }

        let resolved = self
            .msg
            .handlers
            .iter()
            .map(|path| {
                debug!(path = %path, "importing handler");
                importer.import(path)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.handlers.get_or_init(|| resolved).clone())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(MsgConfig::default())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("msg", &self.msg)
            .field("skip_send", &self.skip_send())
            .field("handlers_resolved", &self.handlers.get().is_some())
            .finish()
    }
}
