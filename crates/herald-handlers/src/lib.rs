// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler families for Herald.
//!
//! Each family ([`EmailHandler`], [`SesHandler`], [`SmsHandler`]) supplies
//! `send` and its required fields, and is composed with a [`SourceParser`]
//! that supplies `match` and `parse`. A family without a parser is not a
//! [`herald_core::Handler`] and so can never be registered.

pub mod builtin;
pub mod email;
pub mod matching;
pub mod ses;
pub mod sms;
pub mod template;
pub mod transports;

pub use builtin::builtin_catalog;
pub use email::{EmailHandler, EmailTemplates, SmtpTransport};
pub use matching::{AnySource, MatchMode, SourceParser, TypeMatched};
pub use ses::{SesHandler, SesTransport};
pub use sms::{SmsHandler, SmsTemplates, TwilioTransport};
pub use template::{FileTemplateRenderer, InlineTemplateRenderer};
pub use transports::transports_from_config;
