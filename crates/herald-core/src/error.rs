// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald dispatch framework.

use thiserror::Error;

use crate::types::RecordId;

/// The primary error type used across handlers, storage, and dispatch.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (missing transport settings, bad import strings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A handler is missing one or more required fields. Raised at registration.
    #[error("handler `{handler}` is required to define {}", .missing.join(", "))]
    IncompleteHandler {
        handler: String,
        missing: Vec<String>,
    },

    /// Two handlers share the same name. Raised at registration.
    #[error(
        "handler name `{name}` is already registered; \
         handlers with colliding names cannot both be registered"
    )]
    AmbiguousHandler { name: String },

    /// No registered handler accepted the source object.
    #[error("no handler found for source `{object}`")]
    NoHandlerFound { object: String },

    /// A persisted record names a handler that is no longer registered.
    #[error("message handler `{kind}` does not exist")]
    HandlerResolution { kind: String },

    /// The record is already being dispatched.
    #[error("message {id} is already pending dispatch")]
    AlreadyPending { id: RecordId },

    /// The record does not exist.
    #[error("message {id} not found")]
    RecordNotFound { id: RecordId },

    /// A handler could not interpret the source it matched.
    #[error("failed to parse source: {0}")]
    Parse(String),

    /// Template lookup or rendering failed.
    #[error("template error: {0}")]
    Template(String),

    /// A delivery transport failed to transmit the message.
    #[error("transport error ({transport}): {message}")]
    Transport {
        transport: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Builds a transport error without an underlying cause.
    pub fn transport(transport: &str, message: impl Into<String>) -> Self {
        HeraldError::Transport {
            transport: transport.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Builds a transport error wrapping the cause.
    pub fn transport_with<E>(transport: &str, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HeraldError::Transport {
            transport: transport.to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps any error as a storage error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HeraldError::Storage {
            source: Box::new(source),
        }
    }
}
