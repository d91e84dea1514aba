// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end dispatch tests.
//!
//! `TestHarness` assembles a registry, a temp SQLite store and queue, mock
//! transports, a mock locale, and a [`Dispatcher`] wired to all of them.

use std::sync::Arc;
use std::time::Duration;

use herald_config::Settings;
use herald_config::model::{MsgConfig, StorageConfig};
use herald_core::{Handler, HeraldError, MessageRecord, Transports};
use herald_dispatch::{Dispatcher, QueueWorker};
use herald_registry::HandlerRegistry;
use herald_storage::{SqliteStore, SqliteTaskQueue};

use crate::fixtures;
use crate::mock_locale::MockLocale;
use crate::mock_transport::{
    FailingTransport, MockBulkEmailTransport, MockEmailTransport, MockSmsTransport,
};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    handlers: Vec<Arc<dyn Handler>>,
    msg: MsgConfig,
    failing: Option<String>,
    initial_locale: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            handlers: Vec::new(),
            msg: MsgConfig::default(),
            failing: None,
            initial_locale: "en".to_string(),
        }
    }

    /// Registers a handler, in call order.
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Makes `async` the default dispatch mode.
    pub fn dispatch_async(mut self, dispatch_async: bool) -> Self {
        self.msg.dispatch_async = dispatch_async;
        self
    }

    pub fn skip_send(mut self, skip_send: bool) -> Self {
        self.msg.skip_send = skip_send;
        self
    }

    pub fn default_lang(mut self, language: &str) -> Self {
        self.msg.default_lang = language.to_string();
        self
    }

    /// Locale active before any dispatch.
    pub fn initial_locale(mut self, locale: &str) -> Self {
        self.initial_locale = locale.to_string();
        self
    }

    /// Replaces every transport with one that fails with `message`.
    pub fn failing_transports(mut self, message: &str) -> Self {
        self.failing = Some(message.to_string());
        self
    }

    /// Build the harness. Registration errors are returned as is.
    pub async fn build(self) -> Result<TestHarness, HeraldError> {
        let temp_dir = tempfile::TempDir::new().map_err(HeraldError::storage)?;
        let storage_config = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::new(storage_config);
        store.initialize().await?;
        let store = Arc::new(store);
        let queue = Arc::new(SqliteTaskQueue::new(store.database()?.clone(), "dispatch"));

        let mut registry = HandlerRegistry::new();
        for handler in self.handlers {
            registry.register(handler)?;
        }
        let registry = Arc::new(registry);

        let email = Arc::new(MockEmailTransport::new());
        let bulk_email = Arc::new(MockBulkEmailTransport::new());
        let sms = Arc::new(MockSmsTransport::new());
        let transports = match &self.failing {
            Some(message) => {
                let failing = Arc::new(FailingTransport::new(message.clone()));
                Transports::new()
                    .with_email(failing.clone())
                    .with_bulk_email(failing.clone())
                    .with_sms(failing)
            }
            None => Transports::new()
                .with_email(email.clone())
                .with_bulk_email(bulk_email.clone())
                .with_sms(sms.clone()),
        };

        let settings = Arc::new(Settings::new(self.msg));
        let locale = Arc::new(MockLocale::new(self.initial_locale));
        let dispatcher = Dispatcher::builder(
            Arc::clone(&registry),
            store.clone(),
            Arc::clone(&settings),
            Arc::new(fixtures::renderer()),
        )
        .queue(queue.clone())
        .locale(locale.clone())
        .transports(transports)
        .build();

        Ok(TestHarness {
            dispatcher: Arc::new(dispatcher),
            registry,
            store,
            queue,
            settings,
            locale,
            email,
            bulk_email,
            sms,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock transports and temp storage.
pub struct TestHarness {
    pub dispatcher: Arc<Dispatcher>,
    pub registry: Arc<HandlerRegistry>,
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub queue: Arc<SqliteTaskQueue>,
    pub settings: Arc<Settings>,
    pub locale: Arc<MockLocale>,
    pub email: Arc<MockEmailTransport>,
    pub bulk_email: Arc<MockBulkEmailTransport>,
    pub sms: Arc<MockSmsTransport>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A worker draining this harness's queue with a short poll interval.
    pub fn worker(&self) -> QueueWorker {
        QueueWorker::new(
            Arc::clone(&self.dispatcher),
            self.queue.clone(),
            Duration::from_millis(10),
        )
    }

    /// Reads a record back from the store.
    pub async fn record(&self, id: i64) -> Result<MessageRecord, HeraldError> {
        use herald_core::MessageStore;
        self.store
            .get(id)
            .await?
            .ok_or(HeraldError::RecordNotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{MessageStatus, MessageStore, RecordFilter};

    use super::*;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder()
            .with_handler(fixtures::welcome_handler())
            .build()
            .await
            .unwrap();
        assert_eq!(harness.registry.names(), vec!["welcome"]);
        assert!(harness.store.list(&RecordFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn harness_dispatches_through_mock_email() {
        let harness = TestHarness::builder()
            .with_handler(fixtures::welcome_handler())
            .build()
            .await
            .unwrap();
        let record = harness
            .dispatcher
            .new_message(&fixtures::new_user("ada", "ada@example.com"), true, None)
            .await
            .unwrap();
        assert_eq!(record.status, MessageStatus::Done);
        assert_eq!(harness.email.outbox.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_handler_fails_build() {
        let result = TestHarness::builder()
            .with_handler(fixtures::welcome_handler())
            .with_handler(fixtures::welcome_handler())
            .build()
            .await;
        assert!(matches!(result, Err(HeraldError::AmbiguousHandler { .. })));
    }
}
