// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The handler capability contract and its registration descriptor.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::traits::render::TemplateRenderer;
use crate::traits::transport::Transports;
use crate::types::{MessageContext, MessageRecord, Source};

/// Field every handler must define.
pub const NAME_FIELD: &str = "name";

/// Declared shape of a handler, checked once when it is registered.
///
/// Each layer of a handler (its family, its matcher) appends the fields it
/// requires and defines the ones it has values for. Registration fails if a
/// required field is left undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerDescriptor {
    name: Option<String>,
    required: Vec<&'static str>,
    defined: BTreeMap<&'static str, String>,
}

impl HandlerDescriptor {
    /// Starts a descriptor. `name` is always required.
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            required: vec![NAME_FIELD],
            defined: BTreeMap::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()))
    }

    /// Adds required fields, keeping declaration order and skipping duplicates.
    pub fn require(mut self, fields: &[&'static str]) -> Self {
        for field in fields {
            if !self.required.contains(field) {
                self.required.push(field);
            }
        }
        self
    }

    /// Defines a field value. `None` leaves the field undefined.
    pub fn define(mut self, field: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.defined.insert(field, value.to_string());
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for diagnostics, even when undefined.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn required(&self) -> &[&'static str] {
        &self.required
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        if field == NAME_FIELD {
            return self.name();
        }
        self.defined.get(field).map(String::as_str)
    }

    /// Required fields without a value, in declaration order.
    pub fn missing(&self) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|field| self.get(field).is_none())
            .collect()
    }

    /// Fails with [`HeraldError::IncompleteHandler`] if any required field is undefined.
    pub fn validate(&self) -> Result<(), HeraldError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(HeraldError::IncompleteHandler {
                handler: self.display_name().to_string(),
                missing: missing.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

/// Collaborators available to a handler while it sends.
///
/// `locale` is the language activated for this send.
pub struct SendContext<'a> {
    pub locale: &'a str,
    pub renderer: &'a dyn TemplateRenderer,
    pub transports: &'a Transports,
}

/// A pluggable unit that recognizes a class of source objects, extracts
/// message content from them, and transmits the resulting message.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Declares the handler's name and required fields.
    fn descriptor(&self) -> HandlerDescriptor;

    /// Returns true if this handler can interpret the source.
    fn matches(&self, source: &Source) -> bool;

    /// Extracts recipients, context, and language. Must not perform I/O.
    fn parse(&self, source: &Source) -> Result<MessageContext, HeraldError>;

    /// Renders and transmits the record. Must not change the record's status.
    async fn send(&self, record: &MessageRecord, cx: &SendContext<'_>) -> Result<(), HeraldError>;
}

/// Resolves an import string to a handler instance.
pub trait HandlerImporter: Send + Sync {
    fn import(&self, path: &str) -> Result<Arc<dyn Handler>, HeraldError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_always_required() {
        let d = HandlerDescriptor::new(None);
        assert_eq!(d.missing(), vec!["name"]);
        assert!(HandlerDescriptor::named("welcome").missing().is_empty());
    }

    #[test]
    fn layered_requirements_accumulate() {
        let d = HandlerDescriptor::named("welcome")
            .require(&["subject", "template_text"])
            .require(&["template_text", "type"])
            .define("subject", Some("Hi"))
            .define("type", None);
        assert_eq!(d.required(), &["name", "subject", "template_text", "type"]);
        assert_eq!(d.missing(), vec!["template_text", "type"]);
        assert_eq!(d.get("subject"), Some("Hi"));
    }

    #[test]
    fn validate_reports_every_missing_field() {
        let err = HandlerDescriptor::new(None)
            .require(&["template_text"])
            .validate()
            .unwrap_err();
        match err {
            HeraldError::IncompleteHandler { handler, missing } => {
                assert_eq!(handler, "<unnamed>");
                assert_eq!(missing, vec!["name", "template_text"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
