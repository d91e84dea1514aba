// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task queue contracts for asynchronous dispatch.
//!
//! The producer side only submits record identifiers. The consumer side is
//! used by the queue worker to claim, acknowledge, and fail tasks.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::RecordId;

/// A task claimed from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    /// Queue entry identifier, used for ack/fail.
    pub id: i64,
    /// Message record to deliver.
    pub record_id: RecordId,
    /// Previous failed attempts.
    pub attempts: i32,
}

/// Fire-and-forget submission of a record for later delivery.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queues the record. A record with a task still waiting or in flight is
    /// not queued again.
    async fn submit(&self, record_id: RecordId) -> Result<(), HeraldError>;
}

/// Consumer side of the task queue.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Claims the next task, or `None` if the queue is empty.
    async fn next_task(&self) -> Result<Option<QueuedTask>, HeraldError>;

    /// Marks the task as completed.
    async fn complete(&self, task: &QueuedTask) -> Result<(), HeraldError>;

    /// Marks the task as failed; the queue decides whether to retry.
    async fn fail(&self, task: &QueuedTask) -> Result<(), HeraldError>;
}
