// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-made handlers, sources, and templates for tests.

use std::sync::Arc;

use serde_json::Value;

use herald_core::{
    AccountCreated, Handler, HeraldError, MessageContext, RenderContext, SmsRequest, Source,
};
use herald_handlers::{
    EmailHandler, EmailTemplates, InlineTemplateRenderer, SesHandler, SmsHandler, SmsTemplates,
    TypeMatched,
};

/// A new-user source object. Chain `.with_extra("language", ..)` to set a language.
pub fn new_user(username: &str, email: &str) -> Source {
    Source::from(AccountCreated {
        username: username.to_string(),
        email: email.to_string(),
        phone_number: None,
    })
}

pub fn sms_request(username: &str, phone_number: &str) -> Source {
    Source::from(SmsRequest {
        phone_number: phone_number.to_string(),
        username: username.to_string(),
    })
}

fn parse_new_user(source: &Source) -> Result<MessageContext, HeraldError> {
    let account = source
        .account_created()
        .ok_or_else(|| HeraldError::Parse(format!("not a new user: {}", source.describe())))?;
    let mut context = RenderContext::new();
    context.insert("username".into(), Value::String(account.username.clone()));
    let message = MessageContext::new(vec![account.email.clone()], context);
    Ok(match source.extra.get("language").and_then(Value::as_str) {
        Some(language) => message.with_language(language),
        None => message,
    })
}

fn parse_sms_request(source: &Source) -> Result<MessageContext, HeraldError> {
    let request = source
        .sms_request()
        .ok_or_else(|| HeraldError::Parse(format!("not an SMS request: {}", source.describe())))?;
    let mut context = RenderContext::new();
    context.insert("username".into(), Value::String(request.username.clone()));
    Ok(MessageContext::new(vec![request.phone_number.clone()], context))
}

/// SMTP email handler named `name` for every `account` event.
pub fn email_handler(name: &str) -> Arc<dyn Handler> {
    Arc::new(EmailHandler::new(
        name,
        EmailTemplates::new()
            .subject("Welcome aboard")
            .template_text("emails/welcome.txt")
            .template_html("emails/welcome.html"),
        TypeMatched::subtype("account", parse_new_user),
    ))
}

/// The `welcome` email handler.
pub fn welcome_handler() -> Arc<dyn Handler> {
    email_handler("welcome")
}

/// Bulk email handler for account creation only.
pub fn newsletter_handler() -> Arc<dyn Handler> {
    Arc::new(SesHandler::new(
        "newsletter",
        EmailTemplates::new()
            .subject("News")
            .template_text("emails/welcome.txt")
            .template_html("emails/welcome.html"),
        TypeMatched::exact(AccountCreated::TYPE, parse_new_user),
    ))
}

/// SMS handler for SMS requests.
pub fn hello_handler() -> Arc<dyn Handler> {
    Arc::new(SmsHandler::new(
        "hello",
        SmsTemplates::new().template_text("sms/hello.txt"),
        TypeMatched::exact(SmsRequest::TYPE, parse_sms_request),
    ))
}

/// Templates used by the fixture handlers, with a French variant of the
/// plain-text welcome.
pub fn renderer() -> InlineTemplateRenderer {
    InlineTemplateRenderer::new()
        .with("emails/welcome.txt", "Welcome, {{ username }}!")
        .with("fr/emails/welcome.txt", "Bienvenue, {{ username }} !")
        .with("emails/welcome.html", "<p>Welcome, {{ username }}!</p>")
        .with("sms/hello.txt", "Hello {{ username }}")
}
