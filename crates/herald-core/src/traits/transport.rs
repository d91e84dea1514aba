// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery transport traits (SMTP email, bulk cloud email, SMS).
//!
//! Transports only transmit already-rendered content. Rendering happens in
//! the handler's `send`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HeraldError;

/// Charset used for every bulk email part.
pub const BULK_EMAIL_CHARSET: &str = "UTF-8";

/// A rendered email for a multipart transport. The sender is owned by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub subject: String,
    pub to: Vec<String>,
    pub text: String,
    pub html: Option<String>,
}

/// A rendered email for a bulk cloud email API. Both bodies are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkEmail {
    pub subject: String,
    pub to: Vec<String>,
    pub text: String,
    pub html: String,
}

/// A single rendered SMS.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundSms {
    pub to: String,
    pub body: String,
}

/// Sends multipart email (plain text with optional HTML alternative).
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send_email(&self, email: OutboundEmail) -> Result<(), HeraldError>;
}

/// Sends structured email through a bulk cloud email API.
#[async_trait]
pub trait BulkEmailTransport: Send + Sync {
    async fn send_bulk_email(&self, email: BulkEmail) -> Result<(), HeraldError>;
}

/// Sends one SMS to one recipient.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send_sms(&self, sms: OutboundSms) -> Result<(), HeraldError>;
}

/// The set of configured transports handed to handlers at send time.
#[derive(Clone, Default)]
pub struct Transports {
    email: Option<Arc<dyn EmailTransport>>,
    bulk_email: Option<Arc<dyn BulkEmailTransport>>,
    sms: Option<Arc<dyn SmsTransport>>,
}

impl Transports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, transport: Arc<dyn EmailTransport>) -> Self {
        self.email = Some(transport);
        self
    }

    pub fn with_bulk_email(mut self, transport: Arc<dyn BulkEmailTransport>) -> Self {
        self.bulk_email = Some(transport);
        self
    }

    pub fn with_sms(mut self, transport: Arc<dyn SmsTransport>) -> Self {
        self.sms = Some(transport);
        self
    }

    pub fn email(&self) -> Result<&dyn EmailTransport, HeraldError> {
        self.email
            .as_deref()
            .ok_or_else(|| HeraldError::Config("email transport is not configured".into()))
    }

    pub fn bulk_email(&self) -> Result<&dyn BulkEmailTransport, HeraldError> {
        self.bulk_email
            .as_deref()
            .ok_or_else(|| HeraldError::Config("bulk email transport is not configured".into()))
    }

    pub fn sms(&self) -> Result<&dyn SmsTransport, HeraldError> {
        self.sms
            .as_deref()
            .ok_or_else(|| HeraldError::Config("SMS transport is not configured".into()))
    }
}

impl std::fmt::Debug for Transports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transports")
            .field("email", &self.email.is_some())
            .field("bulk_email", &self.bulk_email.is_some())
            .field("sms", &self.sms.is_some())
            .finish()
    }
}
