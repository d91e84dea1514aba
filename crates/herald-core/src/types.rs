// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message, source, and status types shared across the Herald workspace.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Primary key of a persisted message record.
pub type RecordId = i64;

/// Render-time context attached to a message.
pub type RenderContext = Map<String, Value>;

/// Maximum length of a stored language code.
pub const MAX_LANGUAGE_LEN: usize = 32;

/// Delivery status of a message record.
///
/// Stored as a small integer: NEW(1), PENDING(2), DONE(3), ERROR(4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    New,
    Pending,
    Done,
    Error,
}

impl MessageStatus {
    /// Integer code persisted for this status.
    pub fn code(self) -> u8 {
        match self {
            MessageStatus::New => 1,
            MessageStatus::Pending => 2,
            MessageStatus::Done => 3,
            MessageStatus::Error => 4,
        }
    }

    /// Parses a persisted integer code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageStatus::New),
            2 => Some(MessageStatus::Pending),
            3 => Some(MessageStatus::Done),
            4 => Some(MessageStatus::Error),
            _ => None,
        }
    }

    /// DONE and ERROR end a dispatch attempt. An operator may still re-dispatch.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Done | MessageStatus::Error)
    }

    /// Statuses from which a record may enter PENDING.
    pub fn claimable() -> [MessageStatus; 3] {
        [MessageStatus::New, MessageStatus::Done, MessageStatus::Error]
    }
}

/// Dotted type path identifying the kind of a source object, e.g. `account.created`.
///
/// A path is "within" another when it equals it or is nested beneath it
/// segment-wise: `account.created` is within `account`, `accounts` is not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypePath(String);

impl TypePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` equals `ancestor` or is nested beneath it.
    pub fn is_within(&self, ancestor: &TypePath) -> bool {
        match self.0.strip_prefix(ancestor.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A newly created user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl AccountCreated {
    pub const TYPE: &'static str = "account.created";
}

/// A request to greet a user over SMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsRequest {
    pub phone_number: String,
    pub username: String,
}

impl SmsRequest {
    pub const TYPE: &'static str = "sms.request";
}

/// Any other triggering object, identified by its own type path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub type_path: TypePath,
    #[serde(default)]
    pub payload: Value,
}

impl Trigger {
    pub fn new(type_path: impl Into<TypePath>, payload: Value) -> Self {
        Self {
            type_path: type_path.into(),
            payload,
        }
    }
}

/// The object a message is being created from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceObject {
    AccountCreated(AccountCreated),
    SmsRequest(SmsRequest),
    Trigger(Trigger),
    /// No object at all; only handlers that match unconditionally accept it.
    Nothing,
}

impl SourceObject {
    /// Type path of the object, or `None` for [`SourceObject::Nothing`].
    pub fn type_path(&self) -> Option<TypePath> {
        match self {
            SourceObject::AccountCreated(_) => Some(TypePath::new(AccountCreated::TYPE)),
            SourceObject::SmsRequest(_) => Some(TypePath::new(SmsRequest::TYPE)),
            SourceObject::Trigger(t) => Some(t.type_path.clone()),
            SourceObject::Nothing => None,
        }
    }
}

/// Input to handler matching and parsing: the object plus free-form extras.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub object: SourceObject,
    pub extra: Map<String, Value>,
}

impl Source {
    pub fn new(object: SourceObject) -> Self {
        Self {
            object,
            extra: Map::new(),
        }
    }

    pub fn nothing() -> Self {
        Self::new(SourceObject::Nothing)
    }

    /// Attaches an extra keyword value.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn type_path(&self) -> Option<TypePath> {
        self.object.type_path()
    }

    pub fn account_created(&self) -> Option<&AccountCreated> {
        match &self.object {
            SourceObject::AccountCreated(a) => Some(a),
            _ => None,
        }
    }

    pub fn sms_request(&self) -> Option<&SmsRequest> {
        match &self.object {
            SourceObject::SmsRequest(s) => Some(s),
            _ => None,
        }
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        match &self.object {
            SourceObject::Trigger(t) => Some(t),
            _ => None,
        }
    }

    /// Short description used in logs and "no handler" errors.
    pub fn describe(&self) -> String {
        self.type_path()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "<nothing>".to_string())
    }
}

impl From<AccountCreated> for Source {
    fn from(value: AccountCreated) -> Self {
        Source::new(SourceObject::AccountCreated(value))
    }
}

impl From<SmsRequest> for Source {
    fn from(value: SmsRequest) -> Self {
        Source::new(SourceObject::SmsRequest(value))
    }
}

impl From<Trigger> for Source {
    fn from(value: Trigger) -> Self {
        Source::new(SourceObject::Trigger(value))
    }
}

/// Recipients, render context, and language produced by parsing a source.
///
/// When no language is set, record creation falls back to the configured
/// default language.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContext {
    recipients: Vec<String>,
    context: RenderContext,
    language: Option<String>,
}

impl MessageContext {
    pub fn new(recipients: Vec<String>, context: RenderContext) -> Self {
        Self {
            recipients,
            context,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Consumes the context into a record insert, filling in the default language.
    pub fn into_new_record(self, kind: &str, default_language: &str) -> NewMessageRecord {
        NewMessageRecord {
            kind: kind.to_string(),
            language: self
                .language
                .unwrap_or_else(|| default_language.to_string()),
            recipients: self.recipients,
            context: self.context,
        }
    }
}

/// Fields needed to insert a message record. Status is always NEW on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessageRecord {
    pub kind: String,
    pub language: String,
    pub recipients: Vec<String>,
    pub context: RenderContext,
}

/// A persisted message record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: RecordId,
    /// Name of the handler that owns this record.
    #[serde(rename = "type")]
    pub kind: String,
    pub status: MessageStatus,
    pub language: String,
    pub recipients: Vec<String>,
    #[serde(default)]
    pub context: RenderContext,
    /// ISO 8601 UTC timestamp, set on insert.
    pub created: String,
    /// ISO 8601 UTC timestamp, refreshed on every update.
    pub modified: String,
}

/// Filter for listing records on the administrative surface.
///
/// Timestamp bounds compare against ISO 8601 strings and are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub kind: Option<String>,
    pub status: Option<MessageStatus>,
    pub language: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub modified_after: Option<String>,
    pub modified_before: Option<String>,
    /// Substring search over type and recipients.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_codes_match_persisted_values() {
        assert_eq!(MessageStatus::New.code(), 1);
        assert_eq!(MessageStatus::Pending.code(), 2);
        assert_eq!(MessageStatus::Done.code(), 3);
        assert_eq!(MessageStatus::Error.code(), 4);
        for code in 1..=4 {
            assert_eq!(MessageStatus::from_code(code).unwrap().code(), code);
        }
        assert!(MessageStatus::from_code(0).is_none());
        assert!(MessageStatus::from_code(5).is_none());
    }

    #[test]
    fn status_display_and_parse() {
        assert_eq!(MessageStatus::Pending.to_string(), "PENDING");
        assert_eq!(MessageStatus::from_str("done").unwrap(), MessageStatus::Done);
        assert!(MessageStatus::Error.is_terminal());
        assert!(!MessageStatus::Pending.is_terminal());
        assert!(!MessageStatus::claimable().contains(&MessageStatus::Pending));
    }

    #[test]
    fn type_path_nesting() {
        let account = TypePath::new("account");
        assert!(TypePath::new("account").is_within(&account));
        assert!(TypePath::new("account.created").is_within(&account));
        assert!(!TypePath::new("accounts").is_within(&account));
        assert!(!account.is_within(&TypePath::new("account.created")));
    }

    #[test]
    fn source_type_paths() {
        let src: Source = AccountCreated {
            username: "ada".into(),
            email: "ada@example.com".into(),
            phone_number: None,
        }
        .into();
        assert_eq!(src.type_path().unwrap().as_str(), "account.created");
        assert!(src.account_created().is_some());
        assert!(src.sms_request().is_none());
        assert_eq!(Source::nothing().describe(), "<nothing>");
    }

    #[test]
    fn message_context_language_falls_back_to_default() {
        let ctx = MessageContext::new(vec!["a@example.com".into()], RenderContext::new());
        assert!(ctx.language().is_none());
        let rec = ctx.clone().into_new_record("welcome", "en");
        assert_eq!(rec.language, "en");
        assert_eq!(rec.kind, "welcome");

        let rec = ctx.with_language("de").into_new_record("welcome", "en");
        assert_eq!(rec.language, "de");
    }

    #[test]
    fn record_serializes_kind_as_type() {
        let record = MessageRecord {
            id: 1,
            kind: "welcome".into(),
            status: MessageStatus::New,
            language: "en".into(),
            recipients: vec!["a@example.com".into()],
            context: RenderContext::new(),
            created: "2026-01-01T00:00:00.000Z".into(),
            modified: "2026-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "welcome");
        assert_eq!(json["status"], "NEW");
    }

    proptest::proptest! {
        #[test]
        fn nested_paths_are_within_their_prefix(
            root in "[a-z]{1,8}",
            child in "[a-z]{1,8}",
        ) {
            let ancestor = TypePath::new(root.clone());
            let nested = TypePath::new(format!("{root}.{child}"));
            let glued = TypePath::new(format!("{root}{child}"));
            proptest::prop_assert!(nested.is_within(&ancestor));
            proptest::prop_assert!(!glued.is_within(&ancestor));
        }
    }
}
