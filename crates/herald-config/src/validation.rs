// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use herald_core::MAX_LANGUAGE_LEN;

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Validates semantic constraints serde cannot express.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let lang = config.msg.default_lang.trim();
    if lang.is_empty() {
        errors.push(ConfigError::Validation {
            message: "msg.default_lang must not be empty".to_string(),
        });
    } else if lang.len() > MAX_LANGUAGE_LEN {
        errors.push(ConfigError::Validation {
            message: format!(
                "msg.default_lang must be at most {MAX_LANGUAGE_LEN} characters, got {}",
                lang.len()
            ),
        });
    }

    if config.worker.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "worker.poll_interval_ms must be greater than zero".to_string(),
        });
    }

    if config.worker.queue_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "worker.queue_name must not be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for path in &config.msg.handlers {
        if !seen.insert(path.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate handler `{path}` in msg.handlers"),
            });
        }
    }

    if config.email.smtp_host.is_some() && config.email.from.is_none() {
        errors.push(ConfigError::Validation {
            message: "email.from is required when email.smtp_host is set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
