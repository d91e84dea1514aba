// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable tests without SMTP servers or SMS gateways.
//!
//! # Components
//!
//! - [`MockEmailTransport`], [`MockBulkEmailTransport`], [`MockSmsTransport`] - capturing
//!   transports
//! - [`FailingTransport`] - a transport that rejects every send
//! - [`MockLocale`] - locale service recording activations
//! - [`MemoryQueue`] - in-memory task queue
//! - [`TestHarness`] - registry, temp database, and dispatcher wired together

pub mod fixtures;
pub mod harness;
pub mod memory_queue;
pub mod mock_locale;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_queue::MemoryQueue;
pub use mock_locale::MockLocale;
pub use mock_transport::{
    FailingTransport, MockBulkEmailTransport, MockEmailTransport, MockSmsTransport, Outbox,
};
