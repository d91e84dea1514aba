// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for handlers and the collaborators they depend on.
//!
//! Async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod handler;
pub mod locale;
pub mod queue;
pub mod render;
pub mod storage;
pub mod transport;

pub use handler::{Handler, HandlerDescriptor, HandlerImporter, SendContext};
pub use locale::LocaleService;
pub use queue::{QueuedTask, TaskQueue, TaskSource};
pub use render::TemplateRenderer;
pub use storage::MessageStore;
pub use transport::{
    BulkEmail, BulkEmailTransport, EmailTransport, OutboundEmail, OutboundSms, SmsTransport,
    Transports,
};
