// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./herald.toml` > `~/.config/herald/herald.toml` >
//! `/etc/herald/herald.toml`, with `HERALD_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HeraldConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/herald/herald.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "herald.toml";

/// Top-level sections an environment variable may address.
const ENV_SECTIONS: &[&str] = &[
    "msg",
    "email",
    "ses",
    "twilio",
    "templates",
    "storage",
    "worker",
    "log",
];

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("herald").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/herald/herald.toml`
/// 3. `~/.config/herald/herald.toml`
/// 4. `./herald.toml`
/// 5. `HERALD_*` environment variables
pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HeraldConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `HERALD_{SECTION}_{KEY}` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `HERALD_EMAIL_SMTP_HOST` maps to `email.smtp_host`. Variables that do not
/// start with a known section are ignored.
fn env_provider() -> Env {
    Env::prefixed("HERALD_")
        .filter(|key| section_key(key.as_str()).is_some())
        .map(|key| {
            section_key(key.as_str())
                .map(|(section, rest)| format!("{section}.{rest}"))
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}

fn section_key(key: &str) -> Option<(&str, &str)> {
    let (section, rest) = key.split_once('_')?;
    let section = ENV_SECTIONS
        .iter()
        .find(|s| s.eq_ignore_ascii_case(section))
        .copied()?;
    (!rest.is_empty()).then_some((section, rest))
}
