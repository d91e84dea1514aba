// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Herald.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Dispatch behavior and handler list.
    #[serde(default)]
    pub msg: MsgConfig,

    /// SMTP email transport.
    #[serde(default)]
    pub email: EmailConfig,

    /// Cloud bulk email transport.
    #[serde(default)]
    pub ses: SesConfig,

    /// SMS gateway transport.
    #[serde(default)]
    pub twilio: TwilioConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Message record storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Asynchronous dispatch worker.
    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Primary dispatch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MsgConfig {
    /// Queue messages for the worker instead of sending on the caller's task.
    #[serde(rename = "async", default)]
    pub dispatch_async: bool,

    /// Import strings naming handler factories, e.g. `builtin::account-created`.
    #[serde(default)]
    pub handlers: Vec<String>,

    /// Language given to messages whose handler does not pick one.
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Skip the transport while still completing the dispatch.
    #[serde(default)]
    pub skip_send: bool,
}

impl Default for MsgConfig {
    fn default() -> Self {
        Self {
            dispatch_async: false,
            handlers: Vec::new(),
            default_lang: default_lang(),
            skip_send: false,
        }
    }
}

fn default_lang() -> String {
    "en".to_string()
}

/// SMTP email configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// Sender address. Required by every email transport.
    #[serde(default)]
    pub from: Option<String>,

    /// Mailbox used as the address part of the bulk email sender.
    #[serde(default)]
    pub host_user: Option<String>,

    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Upgrade the connection with STARTTLS instead of implicit TLS.
    #[serde(default = "default_true")]
    pub starttls: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: None,
            host_user: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            starttls: true,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

/// Cloud bulk email configuration.
///
/// Credentials fall back to `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`
/// when unset.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SesConfig {
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Overrides the regional endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// SMS gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub from_phone_number: Option<String>,

    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_phone_number: None,
            api_base: default_twilio_api_base(),
        }
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

/// Template directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Root directory. Localized templates live in `{dir}/{locale}/`.
    #[serde(default = "default_templates_dir")]
    pub dir: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
        }
    }
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

/// Default database path: `{data_local_dir}/herald/herald.db`, or
/// `herald.db` when no data directory is known.
fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("herald").join("herald.db").display().to_string())
        .unwrap_or_else(|| "herald.db".to_string())
}

/// Queue worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Queue the async path submits to and the worker drains.
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Delay between polls of an empty queue, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_name: default_queue_name(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_queue_name() -> String {
    "dispatch".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
