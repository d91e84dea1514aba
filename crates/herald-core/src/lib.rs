// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Herald dispatch framework.
//!
//! This crate provides the handler contract, the collaborator traits the
//! dispatcher depends on (storage, task queue, locale, templates,
//! transports), the workspace error type, and the message types.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HeraldError;
pub use types::{
    AccountCreated, MAX_LANGUAGE_LEN, MessageContext, MessageRecord, MessageStatus,
    NewMessageRecord, RecordFilter, RecordId, RenderContext, SmsRequest, Source, SourceObject,
    Trigger, TypePath,
};

pub use traits::{
    Handler, HandlerDescriptor, HandlerImporter, LocaleService, MessageStore, QueuedTask,
    SendContext, TaskQueue, TaskSource, TemplateRenderer, Transports,
};
