// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`TaskQueue`] and [`TaskSource`] over the `queue` table.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use herald_core::{HeraldError, QueuedTask, RecordId, TaskQueue, TaskSource};

use crate::database::Database;
use crate::queries;

/// Queue payload: only the record identifier travels through the queue.
#[derive(Debug, Serialize, Deserialize)]
struct DispatchPayload {
    record_id: RecordId,
}

/// Durable task queue sharing the message store's database.
#[derive(Debug, Clone)]
pub struct SqliteTaskQueue {
    db: Database,
    queue_name: String,
}

impl SqliteTaskQueue {
    pub fn new(db: Database, queue_name: impl Into<String>) -> Self {
        Self {
            db,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Number of tasks waiting for a worker.
    pub async fn pending(&self) -> Result<i64, HeraldError> {
        queries::queue::pending_count(&self.db, &self.queue_name).await
    }
}

#[async_trait]
impl TaskQueue for SqliteTaskQueue {
    async fn submit(&self, record_id: RecordId) -> Result<(), HeraldError> {
        let payload =
            serde_json::to_string(&DispatchPayload { record_id }).map_err(HeraldError::storage)?;
        match queries::queue::enqueue_unique(&self.db, &self.queue_name, &payload).await? {
            Some(id) => debug!(queue = %self.queue_name, entry = id, record_id, "task submitted"),
            None => debug!(queue = %self.queue_name, record_id, "record already queued"),
        }
        Ok(())
    }
}

#[async_trait]
impl TaskSource for SqliteTaskQueue {
    async fn next_task(&self) -> Result<Option<QueuedTask>, HeraldError> {
        loop {
            let Some(entry) = queries::queue::dequeue(&self.db, &self.queue_name).await? else {
                return Ok(None);
            };
            match serde_json::from_str::<DispatchPayload>(&entry.payload) {
                Ok(payload) => {
                    return Ok(Some(QueuedTask {
                        id: entry.id,
                        record_id: payload.record_id,
                        attempts: entry.attempts,
                    }));
                }
                Err(e) => {
                    // An unreadable payload can never succeed; drop it and move on.
                    warn!(entry = entry.id, error = %e, "discarding malformed queue payload");
                    while queries::queue::fail(&self.db, entry.id).await? {}
                }
            }
        }
    }

    async fn complete(&self, task: &QueuedTask) -> Result<(), HeraldError> {
        queries::queue::ack(&self.db, task.id).await
    }

    async fn fail(&self, task: &QueuedTask) -> Result<(), HeraldError> {
        let retry = queries::queue::fail(&self.db, task.id).await?;
        debug!(entry = task.id, record_id = task.record_id, retry, "task failed");
        Ok(())
    }
}
