// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS handler family and a Twilio REST transport.

use std::time::Duration;

use async_trait::async_trait;
use herald_config::model::TwilioConfig;
use herald_core::traits::transport::{OutboundSms, SmsTransport};
use herald_core::{
    Handler, HandlerDescriptor, HeraldError, MessageContext, MessageRecord, SendContext, Source,
};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::email::field;
use crate::matching::SourceParser;

/// Fields every SMS handler must define.
pub const SMS_FIELDS: &[&str] = &["template_text"];

const TRANSPORT: &str = "twilio";

/// Template name for the SMS body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsTemplates {
    pub template_text: Option<String>,
}

impl SmsTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template_text(mut self, template: impl Into<String>) -> Self {
        self.template_text = Some(template.into());
        self
    }
}

/// SMS handler. Renders the body once and sends one message per recipient.
pub struct SmsHandler<P> {
    name: Option<String>,
    templates: SmsTemplates,
    parser: P,
}

impl<P: SourceParser> SmsHandler<P> {
    pub fn new(name: impl Into<String>, templates: SmsTemplates, parser: P) -> Self {
        Self {
            name: Some(name.into()),
            templates,
            parser,
        }
    }
}

#[async_trait]
impl<P: SourceParser> Handler for SmsHandler<P> {
    fn descriptor(&self) -> HandlerDescriptor {
        let descriptor = HandlerDescriptor::new(self.name.clone())
            .require(SMS_FIELDS)
            .define("template_text", self.templates.template_text.as_deref());
        self.parser.describe(descriptor)
    }

    fn matches(&self, source: &Source) -> bool {
        self.parser.matches(source)
    }

    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError> {
        self.parser.parse(source)
    }

    async fn send(&self, record: &MessageRecord, cx: &SendContext<'_>) -> Result<(), HeraldError> {
        let transport = cx.transports.sms()?;
        let template = field(&self.templates.template_text, "template_text")?;
        let body = cx.renderer.render(template, &record.context, cx.locale).await?;

        for recipient in &record.recipients {
            transport
                .send_sms(OutboundSms {
                    to: recipient.clone(),
                    body: body.clone(),
                })
                .await?;
        }
        Ok(())
    }
}

/// Twilio Messages API transport.
#[derive(Debug, Clone)]
pub struct TwilioTransport {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioTransport {
    /// Builds the transport, or returns `None` when no account SID is configured.
    pub fn from_config(config: &TwilioConfig) -> Result<Option<Self>, HeraldError> {
        let Some(account_sid) = config.account_sid.as_deref() else {
            return Ok(None);
        };
        let auth_token = config
            .auth_token
            .as_deref()
            .ok_or_else(|| HeraldError::Config("`twilio.auth_token` is not set".into()))?;
        let from = config
            .from_phone_number
            .as_deref()
            .ok_or_else(|| HeraldError::Config("`twilio.from_phone_number` is not set".into()))?;

        let transport = Self::new(&config.api_base, account_sid, auth_token, from)?;
        info!(account_sid, "Twilio transport configured");
        Ok(Some(transport))
    }

    pub fn new(
        api_base: &str,
        account_sid: &str,
        auth_token: &str,
        from: &str,
    ) -> Result<Self, HeraldError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HeraldError::transport_with(TRANSPORT, "failed to build HTTP client", e))?;
        Ok(Self {
            client,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{account_sid}/Messages.json",
                api_base.trim_end_matches('/')
            ),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    async fn send_sms(&self, sms: OutboundSms) -> Result<(), HeraldError> {
        let params: &[(&str, &str)] = &[
            ("To", &sms.to),
            ("From", &self.from),
            ("Body", &sms.body),
        ];
        let form = serde_urlencoded::to_string(params)
            .map_err(|e| HeraldError::transport_with(TRANSPORT, "failed to encode form", e))?;

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| HeraldError::transport_with(TRANSPORT, "HTTP request failed", e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "SMS accepted");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "SMS rejected");
        Err(HeraldError::transport(
            TRANSPORT,
            format!("API returned {status}: {body}"),
        ))
    }
}
