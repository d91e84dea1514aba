// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers shipped with Herald and the catalog that exposes them.
//!
//! | import string               | handler           | family |
//! |-----------------------------|-------------------|--------|
//! | `builtin::account-created`  | `account-created` | SMTP   |
//! | `builtin::hello-sms`        | `hello-sms`       | SMS    |

use std::sync::Arc;

use herald_core::{
    AccountCreated, Handler, HeraldError, MessageContext, RenderContext, SmsRequest, Source,
};
use herald_registry::HandlerCatalog;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::email::{EmailHandler, EmailTemplates};
use crate::matching::TypeMatched;
use crate::sms::{SmsHandler, SmsTemplates};

pub const ACCOUNT_CREATED: &str = "account-created";
pub const HELLO_SMS: &str = "hello-sms";

/// Extracts a typed object from a source, accepting either the native
/// variant or a trigger whose payload has the same shape.
fn object<T: DeserializeOwned + Clone>(
    source: &Source,
    native: impl FnOnce(&Source) -> Option<&T>,
) -> Result<T, HeraldError> {
    if let Some(object) = native(source) {
        return Ok(object.clone());
    }
    let trigger = source
        .trigger()
        .ok_or_else(|| HeraldError::Parse(format!("unexpected source `{}`", source.describe())))?;
    serde_json::from_value(trigger.payload.clone())
        .map_err(|e| HeraldError::Parse(format!("invalid `{}` payload: {e}", trigger.type_path)))
}

fn parse_account_created(source: &Source) -> Result<MessageContext, HeraldError> {
    let account: AccountCreated = object(source, Source::account_created)?;
    let mut context = RenderContext::new();
    context.insert("username".into(), Value::String(account.username));
    if let Some(login_url) = source.extra.get("login_url") {
        context.insert("login_url".into(), login_url.clone());
    }
    let message = MessageContext::new(vec![account.email], context);
    Ok(match source.extra.get("language").and_then(Value::as_str) {
        Some(language) => message.with_language(language),
        None => message,
    })
}

fn parse_hello_sms(source: &Source) -> Result<MessageContext, HeraldError> {
    let hello: SmsRequest = object(source, Source::sms_request)?;
    let mut context = RenderContext::new();
    context.insert("username".into(), Value::String(hello.username));
    Ok(MessageContext::new(vec![hello.phone_number], context))
}

/// Welcome email for newly created accounts.
pub fn account_created() -> Arc<dyn Handler> {
    Arc::new(EmailHandler::new(
        ACCOUNT_CREATED,
        EmailTemplates::new()
            .subject("Your new account has been created!")
            .template_text("emails/account-created.txt")
            .template_html("emails/account-created.html"),
        TypeMatched::subtype(AccountCreated::TYPE, parse_account_created),
    ))
}

/// Greeting SMS for explicit SMS requests.
pub fn hello_sms() -> Arc<dyn Handler> {
    Arc::new(SmsHandler::new(
        HELLO_SMS,
        SmsTemplates::new().template_text("sms/hello.txt"),
        TypeMatched::exact(SmsRequest::TYPE, parse_hello_sms),
    ))
}

/// Catalog of the built-in handlers under the `builtin` module.
pub fn builtin_catalog() -> HandlerCatalog {
    HandlerCatalog::new()
        .with(format!("builtin::{ACCOUNT_CREATED}"), account_created)
        .with(format!("builtin::{HELLO_SMS}"), hello_sms)
}
