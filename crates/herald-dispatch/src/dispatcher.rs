// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record creation and the dispatch state machine.
//!
//! A record moves `NEW -> PENDING -> DONE | ERROR`. Redispatching a DONE or
//! ERROR record starts the cycle again from PENDING; a record that is already
//! PENDING is never claimed twice unless an operator forces it with
//! [`Claim::Force`].

use std::sync::Arc;

use herald_config::Settings;
use herald_core::{
    Handler, HeraldError, LocaleService, MessageRecord, MessageStatus, MessageStore, RecordId,
    SendContext, Source, TaskQueue, TemplateRenderer, Transports,
};
use herald_registry::{HandlerRegistry, HandlerResolver};
use tracing::{debug, error, info, warn};

use crate::locale::{LocaleScope, ProcessLocale};

/// Where a dispatch performs the send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Send on the caller's task and wait for the outcome.
    Sync,
    /// Hand the record to the task queue and return once it is PENDING.
    Async,
}

impl DispatchMode {
    pub fn from_async_flag(dispatch_async: bool) -> Self {
        if dispatch_async {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        }
    }
}

/// How a dispatch moves a record into PENDING.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Claim {
    /// Only from NEW, DONE or ERROR; a PENDING record fails with
    /// [`HeraldError::AlreadyPending`].
    #[default]
    Conditional,
    /// From any status. Recovers records left PENDING by an interrupted
    /// dispatch, without excluding a sender that is still running.
    Force,
}

/// A freshly inserted record and the handler that matched its source.
pub struct Created {
    pub record: MessageRecord,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Created {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Created")
            .field("record", &self.record)
            .field("handler", &self.record.kind)
            .finish()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn MessageStore>,
    settings: Arc<Settings>,
    renderer: Arc<dyn TemplateRenderer>,
    queue: Option<Arc<dyn TaskQueue>>,
    locale: Option<Arc<dyn LocaleService>>,
    transports: Transports,
}

impl DispatcherBuilder {
    /// Sets the task queue used by asynchronous dispatch.
    pub fn queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Sets the locale service. Defaults to a [`ProcessLocale`] starting at
    /// the configured default language.
    pub fn locale(mut self, locale: Arc<dyn LocaleService>) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn transports(mut self, transports: Transports) -> Self {
        self.transports = transports;
        self
    }

    pub fn build(self) -> Dispatcher {
        let locale = self
            .locale
            .unwrap_or_else(|| Arc::new(ProcessLocale::new(self.settings.default_lang())));
        Dispatcher {
            registry: self.registry,
            store: self.store,
            settings: self.settings,
            renderer: self.renderer,
            queue: self.queue,
            locale,
            transports: self.transports,
        }
    }
}

/// Creates message records from source objects and drives their delivery.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn MessageStore>,
    settings: Arc<Settings>,
    renderer: Arc<dyn TemplateRenderer>,
    queue: Option<Arc<dyn TaskQueue>>,
    locale: Arc<dyn LocaleService>,
    transports: Transports,
}

impl Dispatcher {
    pub fn builder(
        registry: Arc<HandlerRegistry>,
        store: Arc<dyn MessageStore>,
        settings: Arc<Settings>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            store,
            settings,
            renderer,
            queue: None,
            locale: None,
            transports: Transports::new(),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn MessageStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mode used when a caller does not choose one, from the `async` setting.
    pub fn default_mode(&self) -> DispatchMode {
        DispatchMode::from_async_flag(self.settings.dispatch_async())
    }

    /// Finds the first registered handler accepting `source`, parses it, and
    /// inserts a NEW record typed with the handler's name.
    pub async fn create_from_any(&self, source: &Source) -> Result<Created, HeraldError> {
        let entry = self
            .registry
            .find_match(source)
            .ok_or_else(|| HeraldError::NoHandlerFound {
                object: source.describe(),
            })?;

        let context = entry.handler.parse(source)?;
        let new_record = context.into_new_record(entry.name(), self.settings.default_lang());
        let record = self.store.insert(&new_record).await?;

        info!(
            record_id = record.id,
            handler = %record.kind,
            recipients = record.recipients.len(),
            "message record created"
        );
        Ok(Created {
            record,
            handler: Arc::clone(&entry.handler),
        })
    }

    /// Creates a record and, if `dispatch_now`, dispatches it right away
    /// using `mode` or the default mode.
    ///
    /// Returns the record as stored after the last transition.
    pub async fn new_message(
        &self,
        source: &Source,
        dispatch_now: bool,
        mode: Option<DispatchMode>,
    ) -> Result<MessageRecord, HeraldError> {
        let Created { record, handler } = self.create_from_any(source).await?;
        if !dispatch_now {
            return Ok(record);
        }

        let mut resolver = HandlerResolver::new(&self.registry);
        resolver.attach(record.kind.clone(), handler);
        self.dispatch_with(&mut resolver, &record, mode, Claim::Conditional).await?;
        self.reload(record.id).await
    }

    /// Dispatches a record. Returns the status it reached: PENDING for the
    /// asynchronous path, DONE for a successful synchronous send.
    pub async fn dispatch(
        &self,
        record: &MessageRecord,
        mode: Option<DispatchMode>,
    ) -> Result<MessageStatus, HeraldError> {
        let mut resolver = HandlerResolver::new(&self.registry);
        self.dispatch_with(&mut resolver, record, mode, Claim::Conditional).await
    }

    /// Loads a record by id and dispatches it.
    pub async fn dispatch_by_id(
        &self,
        id: RecordId,
        mode: Option<DispatchMode>,
    ) -> Result<MessageStatus, HeraldError> {
        let record = self.reload(id).await?;
        self.dispatch(&record, mode).await
    }

    /// Loads a record by id and dispatches it even if it is PENDING.
    pub async fn redispatch_by_id(
        &self,
        id: RecordId,
        mode: Option<DispatchMode>,
    ) -> Result<MessageStatus, HeraldError> {
        let record = self.reload(id).await?;
        let mut resolver = HandlerResolver::new(&self.registry);
        self.dispatch_with(&mut resolver, &record, mode, Claim::Force).await
    }

    /// [`Dispatcher::dispatch`] with a caller-held resolver, so a bulk action
    /// looks each handler up once, and an explicit claim.
    pub async fn dispatch_with(
        &self,
        resolver: &mut HandlerResolver<'_>,
        record: &MessageRecord,
        mode: Option<DispatchMode>,
        claim: Claim,
    ) -> Result<MessageStatus, HeraldError> {
        let mode = mode.unwrap_or_else(|| self.default_mode());
        let queue = match mode {
            DispatchMode::Async => Some(self.queue.as_ref().ok_or_else(|| {
                HeraldError::Config("asynchronous dispatch requires a task queue".into())
            })?),
            DispatchMode::Sync => None,
        };

        match claim {
            Claim::Conditional => self.store.claim(record.id).await?,
            Claim::Force => {
                warn!(record_id = record.id, status = ?record.status, "forcing record to pending");
                self.store.reclaim(record.id).await?
            }
        }
        info!(record_id = record.id, handler = %record.kind, ?mode, "message pending");

        let mut pending = record.clone();
        pending.status = MessageStatus::Pending;

        match queue {
            Some(queue) => {
                if let Err(e) = queue.submit(record.id).await {
                    error!(record_id = record.id, error = %e, "failed to queue message");
                    self.store.set_status(record.id, MessageStatus::Error).await?;
                    return Err(e);
                }
                Ok(MessageStatus::Pending)
            }
            None => self.deliver(resolver, &pending).await,
        }
    }

    /// Worker entry point for a queued record.
    ///
    /// A PENDING record is delivered as is; the queue holds at most one live
    /// task per record, so no second worker holds it. An ERROR record, left by
    /// an earlier failed attempt, is claimed again first. NEW and DONE records
    /// need no delivery and are left alone.
    pub async fn deliver_queued(&self, id: RecordId) -> Result<MessageStatus, HeraldError> {
        let mut record = self.reload(id).await?;
        match record.status {
            MessageStatus::Pending => {}
            MessageStatus::Error => {
                self.store.claim(id).await?;
                record.status = MessageStatus::Pending;
            }
            status @ (MessageStatus::New | MessageStatus::Done) => {
                debug!(record_id = id, ?status, "queued record not pending, skipping");
                return Ok(status);
            }
        }

        let mut resolver = HandlerResolver::new(&self.registry);
        self.deliver(&mut resolver, &record).await
    }

    /// Sends a PENDING record under its language and persists the outcome.
    ///
    /// A record whose type has no handler fails like a send and ends in ERROR.
    /// With skip_send active the handler is not looked up at all.
    async fn deliver(
        &self,
        resolver: &mut HandlerResolver<'_>,
        record: &MessageRecord,
    ) -> Result<MessageStatus, HeraldError> {
        let locale = if record.language.is_empty() {
            self.settings.default_lang()
        } else {
            record.language.as_str()
        };
        let scope = LocaleScope::enter(self.locale.as_ref(), locale);

        let result = if self.settings.skip_send() {
            info!(record_id = record.id, handler = %record.kind, "skip_send active, not sending");
            Ok(())
        } else {
            self.send(resolver, record, locale).await
        };

        match result {
            Ok(()) => {
                drop(scope);
                self.store.set_status(record.id, MessageStatus::Done).await?;
                info!(
                    record_id = record.id,
                    handler = %record.kind,
                    status = "done",
                    "message sent"
                );
                Ok(MessageStatus::Done)
            }
            Err(e) => {
                warn!(
                    record_id = record.id,
                    handler = %record.kind,
                    error = %e,
                    "message send failed"
                );
                let persisted = self.store.set_status(record.id, MessageStatus::Error).await;
                drop(scope);
                if let Err(store_err) = persisted {
                    error!(
                        record_id = record.id,
                        error = %store_err,
                        "failed to record send error"
                    );
                }
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        resolver: &mut HandlerResolver<'_>,
        record: &MessageRecord,
        locale: &str,
    ) -> Result<(), HeraldError> {
        let handler = resolver.resolve(&record.kind)?;
        let cx = SendContext {
            locale,
            renderer: self.renderer.as_ref(),
            transports: &self.transports,
        };
        handler.send(record, &cx).await
    }

    async fn reload(&self, id: RecordId) -> Result<MessageRecord, HeraldError> {
        self.store
            .get(id)
            .await?
            .ok_or(HeraldError::RecordNotFound { id })
    }
}
