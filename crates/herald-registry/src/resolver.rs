// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-scoped lookup of a record's handler.

use std::collections::HashMap;
use std::sync::Arc;

use herald_core::{Handler, HeraldError};

use crate::registry::HandlerRegistry;

/// Resolves a record's `type` to its handler, memoizing per resolver.
///
/// Create one per request or bulk action. A handler already known to the
/// caller (e.g. the one that matched during creation) can be attached so it
/// is never looked up again.
pub struct HandlerResolver<'r> {
    registry: &'r HandlerRegistry,
    memo: HashMap<String, Arc<dyn Handler>>,
}

impl<'r> HandlerResolver<'r> {
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self {
            registry,
            memo: HashMap::new(),
        }
    }

    /// Seeds the memo with a handler the caller already holds.
    pub fn attach(&mut self, kind: impl Into<String>, handler: Arc<dyn Handler>) {
        self.memo.insert(kind.into(), handler);
    }

    /// Returns the handler for `kind`.
    ///
    /// Fails with [`HeraldError::HandlerResolution`] if no handler of that
    /// name is registered.
    pub fn resolve(&mut self, kind: &str) -> Result<Arc<dyn Handler>, HeraldError> {
        if let Some(handler) = self.memo.get(kind) {
            return Ok(Arc::clone(handler));
        }
        let handler = self
            .registry
            .resolve(kind)
            .ok_or_else(|| HeraldError::HandlerResolution {
                kind: kind.to_string(),
            })?;
        self.memo.insert(kind.to_string(), Arc::clone(&handler));
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use herald_core::{
        HandlerDescriptor, MessageContext, MessageRecord, SendContext, Source,
    };

    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Handler for Named {
        fn descriptor(&self) -> HandlerDescriptor {
            HandlerDescriptor::named(self.0)
        }

        fn matches(&self, _source: &Source) -> bool {
            true
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

    #[test]
    fn resolves_registered_handler_and_memoizes() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(Named("welcome"))).unwrap();

        let mut resolver = HandlerResolver::new(&registry);
        let a = resolver.resolve("welcome").unwrap();
        let b = resolver.resolve("welcome").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_type_fails() {
        let registry = HandlerRegistry::new();
        let mut resolver = HandlerResolver::new(&registry);
        let err = resolver.resolve("retired").err().unwrap();
        assert_eq!(err.to_string(), "message handler `retired` does not exist");
    }

    #[test]
    fn attached_handler_skips_registry() {
        let registry = HandlerRegistry::new();
        let mut resolver = HandlerResolver::new(&registry);
        let held: Arc<dyn Handler> = Arc::new(Named("inline"));
        resolver.attach("inline", Arc::clone(&held));
        assert!(Arc::ptr_eq(&resolver.resolve("inline").unwrap(), &held));
    }
}
