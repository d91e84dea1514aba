// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue worker for asynchronously dispatched records.
//!
//! The worker claims one task at a time, re-enters synchronous delivery on
//! the dispatcher, and acknowledges or fails the task. Cancellation is only
//! observed between tasks, so an in-flight send always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{HeraldError, MessageStatus, TaskSource};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;

/// Drains a [`TaskSource`] through a [`Dispatcher`].
pub struct QueueWorker {
    dispatcher: Arc<Dispatcher>,
    source: Arc<dyn TaskSource>,
    poll_interval: Duration,
}

impl QueueWorker {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        source: Arc<dyn TaskSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dispatcher,
            source,
            poll_interval,
        }
    }

    /// Processes at most one task.
    ///
    /// Returns the record's status as persisted after the task, or `None` if
    /// the queue was empty. A failed delivery is reported to the queue and is
    /// not an error of the worker itself.
    pub async fn run_once(&self) -> Result<Option<MessageStatus>, HeraldError> {
        let Some(task) = self.source.next_task().await? else {
            return Ok(None);
        };
        debug!(
            task = task.id,
            record_id = task.record_id,
            attempts = task.attempts,
            "task claimed"
        );

        match self.dispatcher.deliver_queued(task.record_id).await {
            Ok(status) => {
                self.source.complete(&task).await?;
                Ok(Some(status))
            }
            Err(e) => {
                warn!(record_id = task.record_id, error = %e, "queued delivery failed");
                self.source.fail(&task).await?;
                let record = self
                    .dispatcher
                    .store()
                    .get(task.record_id)
                    .await?
                    .ok_or(HeraldError::RecordNotFound { id: task.record_id })?;
                Ok(Some(record.status))
            }
        }
    }

    /// Runs until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), HeraldError> {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "queue worker running");

        while !cancel.is_cancelled() {
            let idle = match self.run_once().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    error!(error = %e, "queue worker error");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        info!("queue worker stopped");
        Ok(())
    }
}
