// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message creation and dispatch for Herald.
//!
//! The [`Dispatcher`] is the central coordinator that:
//! - matches a source object against the registry and records a NEW message
//! - moves records through `PENDING` to `DONE` or `ERROR`
//! - sends synchronously under the record's language, or queues the record
//!   for the [`QueueWorker`]

pub mod admin;
pub mod dispatcher;
pub mod locale;
pub mod shutdown;
pub mod worker;

pub use admin::{DispatchOutcome, DispatchReport, dispatch_selected, list_records};
pub use dispatcher::{Claim, Created, DispatchMode, Dispatcher, DispatcherBuilder};
pub use locale::{LocaleScope, ProcessLocale};
pub use shutdown::install_signal_handler;
pub use worker::QueueWorker;
