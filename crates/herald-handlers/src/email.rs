// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP email handler family and its lettre-backed transport.

use async_trait::async_trait;
use herald_config::model::EmailConfig;
use herald_core::traits::transport::{EmailTransport, OutboundEmail};
use herald_core::{
    Handler, HandlerDescriptor, HeraldError, MessageContext, MessageRecord, SendContext, Source,
};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::matching::SourceParser;

/// Fields every email-like handler must define.
pub const EMAIL_FIELDS: &[&str] = &["subject", "template_text", "template_html"];

/// Subject and template names shared by the email families.
///
/// An empty `template_html` counts as defined; such handlers send plain text only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailTemplates {
    pub subject: Option<String>,
    pub template_text: Option<String>,
    pub template_html: Option<String>,
}

impl EmailTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn template_text(mut self, template: impl Into<String>) -> Self {
        self.template_text = Some(template.into());
        self
    }

    pub fn template_html(mut self, template: impl Into<String>) -> Self {
        self.template_html = Some(template.into());
        self
    }

    pub(crate) fn describe(&self, descriptor: HandlerDescriptor) -> HandlerDescriptor {
        descriptor
            .require(EMAIL_FIELDS)
            .define("subject", self.subject.as_deref())
            .define("template_text", self.template_text.as_deref())
            .define("template_html", self.template_html.as_deref())
    }
}

/// Reads a field that registration has already checked.
pub(crate) fn field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, HeraldError> {
    value
        .as_deref()
        .ok_or_else(|| HeraldError::Internal(format!("handler field `{name}` is undefined")))
}

/// Email handler sending a multipart plain/HTML message over SMTP.
pub struct EmailHandler<P> {
    name: Option<String>,
    templates: EmailTemplates,
    parser: P,
}

impl<P: SourceParser> EmailHandler<P> {
    pub fn new(name: impl Into<String>, templates: EmailTemplates, parser: P) -> Self {
        Self {
            name: Some(name.into()),
            templates,
            parser,
        }
    }

    /// A handler without a name. Registration rejects it.
    pub fn unnamed(templates: EmailTemplates, parser: P) -> Self {
        Self {
            name: None,
            templates,
            parser,
        }
    }
}

#[async_trait]
impl<P: SourceParser> Handler for EmailHandler<P> {
    fn descriptor(&self) -> HandlerDescriptor {
        let descriptor = self.templates.describe(HandlerDescriptor::new(self.name.clone()));
        self.parser.describe(descriptor)
    }

    fn matches(&self, source: &Source) -> bool {
        self.parser.matches(source)
    }

    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError> {
        self.parser.parse(source)
    }

    async fn send(&self, record: &MessageRecord, cx: &SendContext<'_>) -> Result<(), HeraldError> {
        let transport = cx.transports.email()?;
        let subject = field(&self.templates.subject, "subject")?;
        let text_template = field(&self.templates.template_text, "template_text")?;

        let text = cx.renderer.render(text_template, &record.context, cx.locale).await?;
        let html = match self.templates.template_html.as_deref() {
            Some(template) if !template.is_empty() => {
                Some(cx.renderer.render(template, &record.context, cx.locale).await?)
            }
            _ => None,
        };

        transport
            .send_email(OutboundEmail {
                subject: subject.to_string(),
                to: record.recipients.clone(),
                text,
                html,
            })
            .await
    }
}

/// SMTP transport.
pub struct SmtpTransport {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Builds the transport, or returns `None` when no SMTP host is configured.
    ///
    /// Fails if a host is set without a valid `email.from`.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, HeraldError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| HeraldError::Config("`email.from` is not set".into()))?;
        let from: Mailbox = from
            .parse()
            .map_err(|e| HeraldError::Config(format!("invalid email.from `{from}`: {e}")))?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        }
        .map_err(|e| HeraldError::transport_with("smtp", format!("invalid relay `{host}`"), e))?;

        let mut builder = builder.port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        info!(
            host,
            port = config.smtp_port,
            starttls = config.starttls,
            "SMTP transport configured"
        );
        Ok(Some(Self {
            from,
            mailer: builder.build(),
        }))
    }
}

/// Builds the MIME message: multipart/alternative when HTML is present.
pub fn build_message(from: &Mailbox, email: OutboundEmail) -> Result<Message, HeraldError> {
    let mut builder = Message::builder().from(from.clone()).subject(email.subject);
    for to in &email.to {
        let mailbox: Mailbox = to.parse().map_err(|e| {
            HeraldError::transport_with("smtp", format!("invalid recipient `{to}`"), e)
        })?;
        builder = builder.to(mailbox);
    }

    let built = match email.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(email.text, html)),
        None => builder.singlepart(SinglePart::plain(email.text)),
    };
    built.map_err(|e| HeraldError::transport_with("smtp", "failed to build message", e))
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send_email(&self, email: OutboundEmail) -> Result<(), HeraldError> {
        if email.to.is_empty() {
            debug!("email has no recipients, nothing sent");
            return Ok(());
        }
        let recipients = email.to.len();
        let message = build_message(&self.from, email)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| HeraldError::transport_with("smtp", "delivery failed", e))?;
        debug!(recipients, "email sent");
        Ok(())
    }
}
