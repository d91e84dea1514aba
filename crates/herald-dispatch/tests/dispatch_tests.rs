// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Creation and dispatch behaviour against a real SQLite store.

use std::sync::Arc;

use herald_core::{
    HeraldError, LocaleService, MessageRecord, MessageStatus, MessageStore, NewMessageRecord,
    RecordFilter, Source, TaskQueue,
};
use herald_dispatch::{Claim, DispatchMode, dispatch_selected, list_records};
use herald_test_utils::fixtures::{
    email_handler, hello_handler, new_user, newsletter_handler, sms_request, welcome_handler,
};
use herald_test_utils::{MemoryQueue, TestHarness};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

/// Stores a record whose type names no registered handler.
async fn retired_record(harness: &TestHarness) -> MessageRecord {
    harness
        .store
        .insert(&NewMessageRecord {
            kind: "retired".to_string(),
            language: "en".to_string(),
            recipients: vec!["ada@example.com".to_string()],
            context: Default::default(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn welcome_scenario_sends_exactly_one_email() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();

    let created = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!(created.record.kind, "welcome");
    assert_eq!(created.record.status, MessageStatus::New);
    assert_eq!(created.record.language, "en");
    assert_eq!(created.record.recipients, vec!["ada@example.com"]);
    assert_eq!(
        harness.store.list(&RecordFilter::default()).await.unwrap().len(),
        1
    );

    let status = harness
        .dispatcher
        .dispatch(&created.record, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(status, MessageStatus::Done);

    let sent = harness.email.outbox.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Welcome aboard");
    assert_eq!(sent[0].to, vec!["ada@example.com"]);
    assert_eq!(sent[0].text, "Welcome, ada!");
    assert_eq!(sent[0].html.as_deref(), Some("<p>Welcome, ada!</p>"));
    assert_eq!(
        harness.record(created.record.id).await.unwrap().status,
        MessageStatus::Done
    );
}

#[tokio::test]
async fn zero_handlers_means_no_handler_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let err = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap_err();
    match err {
        HeraldError::NoHandlerFound { object } => assert_eq!(object, "account.created"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(harness.store.list(&RecordFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unmatched_source_is_no_handler_found() {
    let harness = TestHarness::builder()
        .with_handler(hello_handler())
        .build()
        .await
        .unwrap();
    assert!(matches!(
        harness.dispatcher.create_from_any(&Source::nothing()).await,
        Err(HeraldError::NoHandlerFound { .. })
    ));
}

#[tokio::test]
async fn first_registered_match_wins() {
    let harness = TestHarness::builder()
        .with_handler(hello_handler())
        .with_handler(newsletter_handler())
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();

    let created = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!(created.record.kind, "newsletter");

    let sms = harness
        .dispatcher
        .create_from_any(&sms_request("bob", "+15550001111"))
        .await
        .unwrap();
    assert_eq!(sms.record.kind, "hello");
}

#[tokio::test]
async fn failing_send_marks_error_and_returns_the_error() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .failing_transports("relay down")
        .build()
        .await
        .unwrap();

    let created = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    let err = harness
        .dispatcher
        .dispatch(&created.record, Some(DispatchMode::Sync))
        .await
        .unwrap_err();
    match err {
        HeraldError::Transport { message, .. } => assert_eq!(message, "relay down"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        harness.record(created.record.id).await.unwrap().status,
        MessageStatus::Error
    );
}

#[tokio::test]
#[traced_test]
async fn skip_send_reaches_done_without_transport() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .failing_transports("must not be called")
        .skip_send(true)
        .build()
        .await
        .unwrap();

    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Done);
    assert!(logs_contain("skip_send active, not sending"));
}

#[tokio::test]
async fn skip_send_can_be_toggled_at_runtime() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();

    harness.settings.set_skip_send(true);
    harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, None)
        .await
        .unwrap();
    assert_eq!(harness.email.outbox.count().await, 0);

    harness.settings.set_skip_send(false);
    harness
        .dispatcher
        .new_message(&new_user("bob", "bob@example.com"), true, None)
        .await
        .unwrap();
    assert_eq!(harness.email.outbox.count().await, 1);
}

#[tokio::test]
async fn sync_dispatch_sends_in_record_language_and_restores_locale() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .initial_locale("de")
        .build()
        .await
        .unwrap();

    let source = new_user("ada", "ada@example.com").with_extra("language", "fr");
    let record = harness
        .dispatcher
        .new_message(&source, true, Some(DispatchMode::Sync))
        .await
        .unwrap();

    assert_eq!(record.language, "fr");
    assert_eq!(harness.email.outbox.sent().await[0].text, "Bienvenue, ada !");
    assert_eq!(harness.locale.activations(), vec!["fr", "de"]);
    assert_eq!(harness.locale.active(), "de");
}

#[tokio::test]
async fn locale_is_restored_when_send_fails() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .failing_transports("boom")
        .initial_locale("de")
        .build()
        .await
        .unwrap();

    let source = new_user("ada", "ada@example.com").with_extra("language", "fr");
    assert!(
        harness
            .dispatcher
            .new_message(&source, true, Some(DispatchMode::Sync))
            .await
            .is_err()
    );
    assert_eq!(harness.locale.active(), "de");
    assert_eq!(harness.locale.activations(), vec!["fr", "de"]);
}

#[tokio::test]
async fn default_language_applies_when_handler_sets_none() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .default_lang("pt")
        .build()
        .await
        .unwrap();
    let created = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!(created.record.language, "pt");
}

#[tokio::test]
async fn pending_record_cannot_be_dispatched_twice() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();

    let created = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    let status = harness
        .dispatcher
        .dispatch(&created.record, Some(DispatchMode::Async))
        .await
        .unwrap();
    assert_eq!(status, MessageStatus::Pending);

    let err = harness
        .dispatcher
        .dispatch(&created.record, Some(DispatchMode::Sync))
        .await
        .unwrap_err();
    assert!(matches!(err, HeraldError::AlreadyPending { id } if id == created.record.id));
    assert_eq!(harness.email.outbox.count().await, 0);
}

#[tokio::test]
async fn done_and_error_records_can_be_redispatched() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();

    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Done);

    harness
        .dispatcher
        .dispatch_by_id(record.id, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(harness.email.outbox.count().await, 2);

    harness
        .store
        .set_status(record.id, MessageStatus::Error)
        .await
        .unwrap();
    assert_eq!(
        harness
            .dispatcher
            .dispatch_by_id(record.id, Some(DispatchMode::Sync))
            .await
            .unwrap(),
        MessageStatus::Done
    );
}

#[tokio::test]
async fn async_dispatch_queues_and_worker_delivers() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .dispatch_async(true)
        .build()
        .await
        .unwrap();

    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, None)
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Pending);
    assert_eq!(harness.queue.pending().await.unwrap(), 1);
    assert_eq!(harness.email.outbox.count().await, 0);

    let worker = harness.worker();
    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Done));
    assert_eq!(worker.run_once().await.unwrap(), None);

    assert_eq!(harness.email.outbox.count().await, 1);
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Done);
}

#[tokio::test]
async fn worker_retry_redelivers_an_errored_record() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    harness.email.fail_next(1);

    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Async))
        .await
        .unwrap();

    let worker = harness.worker();
    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Error));
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Error);
    assert_eq!(harness.email.outbox.count().await, 0);
    assert_eq!(harness.queue.pending().await.unwrap(), 1);

    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Done));
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Done);
    assert_eq!(harness.email.outbox.count().await, 1);
    assert_eq!(worker.run_once().await.unwrap(), None);
}

#[tokio::test]
async fn worker_acks_task_for_record_already_done() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Done);

    harness.queue.submit(record.id).await.unwrap();
    let worker = harness.worker();
    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Done));
    assert_eq!(harness.email.outbox.count().await, 1);
    assert_eq!(harness.queue.pending().await.unwrap(), 0);
    assert_eq!(worker.run_once().await.unwrap(), None);
}

#[tokio::test]
async fn worker_reports_missing_record_instead_of_error_status() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    harness.queue.submit(9999).await.unwrap();

    let err = harness.worker().run_once().await.unwrap_err();
    assert!(matches!(err, HeraldError::RecordNotFound { id: 9999 }));
}

#[tokio::test]
async fn worker_marks_unresolvable_record_as_error() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let record = retired_record(&harness).await;
    harness
        .dispatcher
        .dispatch(&record, Some(DispatchMode::Async))
        .await
        .unwrap();

    assert_eq!(harness.worker().run_once().await.unwrap(), Some(MessageStatus::Error));
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Error);
}

#[tokio::test]
async fn worker_stops_on_cancellation() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Async))
        .await
        .unwrap();

    let worker = harness.worker();
    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { worker.run(cancel).await })
    };

    for _ in 0..200 {
        if harness.email.outbox.count().await == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(harness.email.outbox.count().await, 1);
}

#[tokio::test]
async fn unknown_record_type_ends_in_error() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .initial_locale("de")
        .build()
        .await
        .unwrap();
    let record = retired_record(&harness).await;

    let err = harness
        .dispatcher
        .dispatch_by_id(record.id, Some(DispatchMode::Sync))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "message handler `retired` does not exist");
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Error);
    assert_eq!(harness.locale.active(), "de");
}

#[tokio::test]
async fn skip_send_does_not_look_up_the_handler() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .skip_send(true)
        .build()
        .await
        .unwrap();
    let record = retired_record(&harness).await;

    let status = harness
        .dispatcher
        .dispatch_by_id(record.id, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(status, MessageStatus::Done);
    assert_eq!(harness.record(record.id).await.unwrap().status, MessageStatus::Done);
}

#[tokio::test]
async fn forced_redispatch_recovers_a_stranded_pending_record() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let record = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap()
        .record;
    // Claimed, then the process died before any outcome was written.
    harness.store.claim(record.id).await.unwrap();

    assert!(matches!(
        harness
            .dispatcher
            .dispatch_by_id(record.id, Some(DispatchMode::Sync))
            .await,
        Err(HeraldError::AlreadyPending { .. })
    ));

    let status = harness
        .dispatcher
        .redispatch_by_id(record.id, Some(DispatchMode::Sync))
        .await
        .unwrap();
    assert_eq!(status, MessageStatus::Done);
    assert_eq!(harness.email.outbox.count().await, 1);
}

#[tokio::test]
async fn forced_async_redispatch_keeps_one_queue_entry() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let record = harness
        .dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Async))
        .await
        .unwrap();
    assert_eq!(record.status, MessageStatus::Pending);

    let status = harness
        .dispatcher
        .redispatch_by_id(record.id, Some(DispatchMode::Async))
        .await
        .unwrap();
    assert_eq!(status, MessageStatus::Pending);
    assert_eq!(harness.queue.pending().await.unwrap(), 1);

    let worker = harness.worker();
    assert_eq!(worker.run_once().await.unwrap(), Some(MessageStatus::Done));
    assert_eq!(worker.run_once().await.unwrap(), None);
    assert_eq!(harness.email.outbox.count().await, 1);
}

#[tokio::test]
async fn dispatch_selected_reports_each_outcome() {
    let harness = TestHarness::builder()
        .with_handler(email_handler("welcome"))
        .build()
        .await
        .unwrap();

    let a = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap()
        .record;
    let b = harness
        .dispatcher
        .create_from_any(&new_user("bob", "bob@example.com"))
        .await
        .unwrap()
        .record;

    let ids = [a.id, 9999, b.id];
    let sync = Some(DispatchMode::Sync);
    let report = dispatch_selected(&harness.dispatcher, &ids, sync, Claim::Conditional).await;
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    let errors: Vec<_> = report.errors().map(|(id, _)| id).collect();
    assert_eq!(errors, vec![9999]);
    assert_eq!(harness.email.outbox.count().await, 2);

    let done = list_records(
        &harness.dispatcher,
        &RecordFilter {
            status: Some(MessageStatus::Done),
            ..RecordFilter::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(done.len(), 2);
}

#[tokio::test]
async fn dispatcher_works_with_memory_queue() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    let dispatcher = herald_dispatch::Dispatcher::builder(
        Arc::clone(&harness.registry),
        harness.store.clone(),
        Arc::clone(&harness.settings),
        Arc::new(herald_test_utils::fixtures::renderer()),
    )
    .queue(queue.clone())
    .build();

    let record = dispatcher
        .new_message(&new_user("ada", "ada@example.com"), true, Some(DispatchMode::Async))
        .await
        .unwrap();
    assert_eq!(queue.waiting().await, vec![record.id]);
    assert_eq!(record.status, MessageStatus::Pending);
}

#[tokio::test]
async fn async_without_queue_is_a_config_error() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let dispatcher = herald_dispatch::Dispatcher::builder(
        Arc::clone(&harness.registry),
        harness.store.clone(),
        Arc::clone(&harness.settings),
        Arc::new(herald_test_utils::fixtures::renderer()),
    )
    .build();

    let created = dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap();
    assert!(matches!(
        dispatcher.dispatch(&created.record, Some(DispatchMode::Async)).await,
        Err(HeraldError::Config(_))
    ));
    assert_eq!(harness.record(created.record.id).await.unwrap().status, MessageStatus::New);
}

#[tokio::test]
async fn forced_bulk_dispatch_includes_pending_records() {
    let harness = TestHarness::builder()
        .with_handler(welcome_handler())
        .build()
        .await
        .unwrap();
    let stuck = harness
        .dispatcher
        .create_from_any(&new_user("ada", "ada@example.com"))
        .await
        .unwrap()
        .record;
    let fresh = harness
        .dispatcher
        .create_from_any(&new_user("bob", "bob@example.com"))
        .await
        .unwrap()
        .record;
    harness.store.claim(stuck.id).await.unwrap();

    let ids = [stuck.id, fresh.id];
    let sync = Some(DispatchMode::Sync);
    let report = dispatch_selected(&harness.dispatcher, &ids, sync, Claim::Conditional).await;
    assert_eq!(report.errors().map(|(id, _)| id).collect::<Vec<_>>(), vec![stuck.id]);

    let report = dispatch_selected(&harness.dispatcher, &ids, sync, Claim::Force).await;
    assert_eq!(report.succeeded(), 2);
    assert_eq!(harness.record(stuck.id).await.unwrap().status, MessageStatus::Done);
    assert_eq!(harness.email.outbox.count().await, 3);
}
