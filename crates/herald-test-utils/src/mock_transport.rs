// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing and failing transports.
//!
//! The capturing transports keep every message they are handed in an outbox
//! for assertions; [`FailingTransport`] rejects everything.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::traits::transport::{
    BulkEmail, BulkEmailTransport, EmailTransport, OutboundEmail, OutboundSms, SmsTransport,
};
use herald_core::HeraldError;

/// Outbox shared by a capturing transport and the test holding it.
#[derive(Debug)]
pub struct Outbox<T> {
    sent: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> Outbox<T> {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn push(&self, item: T) {
        self.sent.lock().await.push(item);
    }

    /// Everything captured so far.
    pub async fn sent(&self) -> Vec<T> {
        self.sent.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

/// Captures SMTP-style email.
#[derive(Debug)]
pub struct MockEmailTransport {
    pub outbox: Outbox<OutboundEmail>,
    failures: AtomicUsize,
}

impl MockEmailTransport {
    pub fn new() -> Self {
        Self {
            outbox: Outbox::new(),
            failures: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` sends fail without capturing anything.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }
}

impl Default for MockEmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailTransport for MockEmailTransport {
    async fn send_email(&self, email: OutboundEmail) -> Result<(), HeraldError> {
        let scheduled = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if scheduled.is_ok() {
            return Err(HeraldError::transport("mock", "scheduled failure"));
        }
        self.outbox.push(email).await;
        Ok(())
    }
}

/// Captures bulk cloud email.
#[derive(Debug)]
pub struct MockBulkEmailTransport {
    pub outbox: Outbox<BulkEmail>,
}

impl MockBulkEmailTransport {
    pub fn new() -> Self {
        Self {
            outbox: Outbox::new(),
        }
    }
}

impl Default for MockBulkEmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BulkEmailTransport for MockBulkEmailTransport {
    async fn send_bulk_email(&self, email: BulkEmail) -> Result<(), HeraldError> {
        self.outbox.push(email).await;
        Ok(())
    }
}

/// Captures SMS, one entry per recipient.
#[derive(Debug)]
pub struct MockSmsTransport {
    pub outbox: Outbox<OutboundSms>,
}

impl MockSmsTransport {
    pub fn new() -> Self {
        Self {
            outbox: Outbox::new(),
        }
    }
}

impl Default for MockSmsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsTransport for MockSmsTransport {
    async fn send_sms(&self, sms: OutboundSms) -> Result<(), HeraldError> {
        self.outbox.push(sms).await;
        Ok(())
    }
}

/// A transport whose every send fails with a transport error.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    message: String,
}

impl FailingTransport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> HeraldError {
        HeraldError::transport("mock", self.message.clone())
    }
}

#[async_trait]
impl EmailTransport for FailingTransport {
    async fn send_email(&self, _email: OutboundEmail) -> Result<(), HeraldError> {
        Err(self.error())
    }
}

#[async_trait]
impl BulkEmailTransport for FailingTransport {
    async fn send_bulk_email(&self, _email: BulkEmail) -> Result<(), HeraldError> {
        Err(self.error())
    }
}

#[async_trait]
impl SmsTransport for FailingTransport {
    async fn send_sms(&self, _sms: OutboundSms) -> Result<(), HeraldError> {
        Err(self.error())
    }
}
