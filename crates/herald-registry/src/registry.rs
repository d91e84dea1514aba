// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of concrete message handlers.
//!
//! Handlers are keyed by their unique name and kept in registration order,
//! which is also the order in which they are offered a source object.

use std::sync::Arc;

use herald_core::{Handler, HandlerDescriptor, HeraldError, Source};
use indexmap::IndexMap;
use tracing::{debug, info};

/// A handler accepted by the registry, with the descriptor it was validated against.
#[derive(Clone)]
pub struct RegisteredHandler {
    pub descriptor: HandlerDescriptor,
    pub handler: Arc<dyn Handler>,
}

impl RegisteredHandler {
    pub fn name(&self) -> &str {
        self.descriptor.display_name()
    }
}

impl std::fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Name-to-handler catalog with uniqueness and completeness checks.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: IndexMap<String, RegisteredHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    ///
    /// Fails with [`HeraldError::IncompleteHandler`] if a required field is
    /// undefined and with [`HeraldError::AmbiguousHandler`] if the name is
    /// taken. The registry is unchanged on failure.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> Result<(), HeraldError> {
        let descriptor = handler.descriptor();
        descriptor.validate()?;

        let name = descriptor.display_name().to_string();
        if self.entries.contains_key(&name) {
            return Err(HeraldError::AmbiguousHandler { name });
        }

        info!(handler = %name, "handler registered");
        self.entries
            .insert(name, RegisteredHandler { descriptor, handler });
        Ok(())
    }

    /// Looks up a handler by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.entries.get(name).map(|e| Arc::clone(&e.handler))
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredHandler> {
        self.entries.get(name)
    }

    /// All registered handlers in registration order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &RegisteredHandler)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// First handler, in registration order, whose `matches` accepts the source.
    pub fn find_match(&self, source: &Source) -> Option<&RegisteredHandler> {
        let found = self.entries.values().find(|e| e.handler.matches(source));
        match found {
            Some(entry) => {
                debug!(handler = %entry.name(), source = %source.describe(), "handler matched")
            }
            None => debug!(source = %source.describe(), "no handler matched"),
        }
        found
    }

    /// Removes every handler.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use herald_core::{
        AccountCreated, MessageContext, MessageRecord, SendContext, Trigger,
    };

    use super::*;

    struct Stub {
        name: Option<&'static str>,
        subject: Option<&'static str>,
        accepts: &'static str,
    }

    impl Stub {
        fn new(name: &'static str, accepts: &'static str) -> Arc<dyn Handler> {
            Arc::new(Stub {
                name: Some(name),
                subject: Some("Hello"),
                accepts,
            })
        }
    }

    #[async_trait]
    impl Handler for Stub {
        fn descriptor(&self) -> HandlerDescriptor {
            HandlerDescriptor::new(self.name.map(str::to_string))
                .require(&["subject"])
                .define("subject", self.subject)
        }

        fn matches(&self, source: &Source) -> bool {
            source
                .type_path()
                .is_some_and(|path| path.as_str() == self.accepts)
        }

        fn parse(&self, _source: &Source) -> Result<MessageContext, HeraldError> {
            Ok(MessageContext::new(vec![], Default::default()))
        }

        async fn send(
            &self,
            _record: &MessageRecord,
            _cx: &SendContext<'_>,
        ) -> Result<(), HeraldError> {
            Ok(())
        }
    }

    fn account() -> Source {
        AccountCreated {
            username: "ada".into(),
            email: "ada@example.com".into(),
            phone_number: None,
        }
        .into()
    }

    #[test]
    fn registers_and_resolves() {
        let mut registry = HandlerRegistry::new();
        registry.register(Stub::new("welcome", "account.created")).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("welcome").is_some());
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected_and_first_kept() {
        let mut registry = HandlerRegistry::new();
        let first = Stub::new("welcome", "account.created");
        registry.register(Arc::clone(&first)).unwrap();

        let err = registry
            .register(Stub::new("welcome", "other.type"))
            .unwrap_err();
        assert!(matches!(err, HeraldError::AmbiguousHandler { ref name } if name == "welcome"));
        assert_eq!(registry.len(), 1);
        let kept = registry.resolve("welcome").unwrap();
        assert!(Arc::ptr_eq(&kept, &first));
    }

    #[test]
    fn incomplete_handler_is_rejected() {
        let mut registry = HandlerRegistry::new();
        let err = registry
            .register(Arc::new(Stub {
                name: Some("welcome"),
                subject: None,
                accepts: "account.created",
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            HeraldError::IncompleteHandler { ref missing, .. } if missing == &["subject"]
        ));
        assert!(registry.is_empty());

        let err = registry
            .register(Arc::new(Stub {
                name: None,
                subject: Some("Hi"),
                accepts: "account.created",
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            HeraldError::IncompleteHandler { ref missing, .. } if missing == &["name"]
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn first_registered_match_wins() {
        let mut registry = HandlerRegistry::new();
        registry.register(Stub::new("other", "order.shipped")).unwrap();
        registry.register(Stub::new("welcome", "account.created")).unwrap();
        registry.register(Stub::new("welcome-2", "account.created")).unwrap();

        let found = registry.find_match(&account()).unwrap();
        assert_eq!(found.name(), "welcome");
        assert_eq!(registry.names(), vec!["other", "welcome", "welcome-2"]);

        let trigger: Source = Trigger::new("nothing.here", serde_json::Value::Null).into();
        assert!(registry.find_match(&trigger).is_none());
    }

    #[test]
    fn reset_empties_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register(Stub::new("welcome", "account.created")).unwrap();
        registry.reset();
        assert!(registry.is_empty());
        registry.register(Stub::new("welcome", "account.created")).unwrap();
        assert_eq!(registry.all().count(), 1);
    }
}
