// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the built-in handlers.
//!
//! Each test builds the stack the way the binary does: configuration from
//! TOML, the built-in catalog, file templates from the repository, a temp
//! SQLite database. Transports are the capturing mocks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use herald_config::{HeraldConfig, Settings};
use herald_core::{
    AccountCreated, MessageStatus, MessageStore, RecordFilter, SmsRequest, Source, Transports,
    Trigger,
};
use herald_dispatch::{Claim, DispatchMode, Dispatcher, QueueWorker, dispatch_selected};
use herald_handlers::{FileTemplateRenderer, builtin_catalog};
use herald_registry::initialize_registry;
use herald_storage::{SqliteStore, SqliteTaskQueue};
use herald_test_utils::{MockEmailTransport, MockSmsTransport};
use serde_json::json;

fn templates_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

struct Stack {
    dispatcher: Arc<Dispatcher>,
    store: Arc<SqliteStore>,
    queue: Arc<SqliteTaskQueue>,
    email: Arc<MockEmailTransport>,
    sms: Arc<MockSmsTransport>,
    _dir: tempfile::TempDir,
}

async fn stack(extra_msg: &str) -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let config: HeraldConfig = herald_config::load_and_validate_str(&format!(
        r#"
[msg]
handlers = ["builtin::account-created", "builtin::hello-sms"]
{extra_msg}

[storage]
database_path = {:?}
"#,
        dir.path().join("herald.db").display().to_string()
    ))
    .unwrap();

    let settings = Arc::new(Settings::new(config.msg.clone()));
    let registry = Arc::new(initialize_registry(&settings, &builtin_catalog()).unwrap());
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await.unwrap();
    let store = Arc::new(store);
    let queue = Arc::new(SqliteTaskQueue::new(
        store.database().unwrap().clone(),
        config.worker.queue_name.clone(),
    ));

    let email = Arc::new(MockEmailTransport::new());
    let sms = Arc::new(MockSmsTransport::new());
    let dispatcher = Dispatcher::builder(
        registry,
        store.clone(),
        settings,
        Arc::new(FileTemplateRenderer::new(templates_dir())),
    )
    .queue(queue.clone())
    .transports(
        Transports::new()
            .with_email(email.clone())
            .with_sms(sms.clone()),
    )
    .build();

    Stack {
        dispatcher: Arc::new(dispatcher),
        store,
        queue,
        email,
        sms,
        _dir: dir,
    }
}

fn ada() -> Source {
    Source::from(AccountCreated {
        username: "ada".into(),
        email: "ada@example.com".into(),
        phone_number: None,
    })
    .with_extra("login_url", "https://example.com/login")
}

#[tokio::test]
async fn account_created_email_renders_repository_templates() {
    let stack = stack("").await;

    let record = stack
        .dispatcher
        .new_message(&ada(), true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.kind, "account-created");
    assert_eq!(record.status, MessageStatus::Done);

    let sent = stack.email.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Your new account has been created!");
    assert_eq!(sent[0].to, vec!["ada@example.com"]);
    assert!(sent[0].text.contains("ada"));
    assert!(sent[0].html.as_deref().is_some_and(|h| h.contains("https://example.com/login")));
}

#[tokio::test]
async fn hello_sms_from_trigger_payload() {
    let stack = stack("").await;

    let source = Source::from(Trigger::new(
        SmsRequest::TYPE,
        json!({"phone_number": "+15550001111", "username": "bo"}),
    ));
    let record = stack
        .dispatcher
        .new_message(&source, true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.kind, "hello-sms");

    let sent = stack.sms.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "+15550001111");
    assert!(sent[0].body.contains("bo"));
}

#[tokio::test]
async fn async_setting_routes_through_the_worker() {
    let stack = stack("async = true").await;

    let record = stack.dispatcher.new_message(&ada(), true, None).await.unwrap();
    assert_eq!(record.status, MessageStatus::Pending);
    assert_eq!(stack.email.outbox.count().await, 0);

    let worker = QueueWorker::new(
        stack.dispatcher.clone(),
        stack.queue.clone(),
        Duration::from_millis(10),
    );
    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Done));
    assert_eq!(stack.email.outbox.count().await, 1);
}

#[tokio::test]
async fn skip_send_setting_completes_without_sending() {
    let stack = stack("skip_send = true").await;
    let record = stack
        .dispatcher
        .new_message(&ada(), true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Done);
    assert_eq!(stack.email.outbox.count().await, 0);
}

#[tokio::test]
async fn operator_redispatch_of_filtered_records() {
    let stack = stack("").await;
    for _ in 0..3 {
        stack.dispatcher.create_from_any(&ada()).await.unwrap();
    }

    let new_records = stack
        .store
        .list(&RecordFilter {
            status: Some(MessageStatus::New),
            search: Some("ada@".into()),
            ..RecordFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(new_records.len(), 3);

    let ids: Vec<_> = new_records.iter().map(|r| r.id).collect();
    let sync = Some(DispatchMode::Sync);
    let report = dispatch_selected(&stack.dispatcher, &ids, sync, Claim::Conditional).await;
    assert_eq!(report.succeeded(), 3);
    assert_eq!(stack.email.outbox.count().await, 3);
}
