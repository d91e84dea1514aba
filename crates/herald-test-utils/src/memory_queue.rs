// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory task queue.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use herald_core::{HeraldError, QueuedTask, RecordId, TaskQueue, TaskSource};

const MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    waiting: VecDeque<QueuedTask>,
    /// Records with a waiting or in-flight task.
    queued: HashSet<RecordId>,
    completed: Vec<RecordId>,
    dead: Vec<RecordId>,
}

/// [`TaskQueue`] and [`TaskSource`] kept in memory, with the same retry
/// accounting and per-record deduplication as the SQLite queue.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record ids waiting for a worker, in queue order.
    pub async fn waiting(&self) -> Vec<RecordId> {
        self.state.lock().await.waiting.iter().map(|t| t.record_id).collect()
    }

    pub async fn completed(&self) -> Vec<RecordId> {
        self.state.lock().await.completed.clone()
    }

    /// Record ids whose tasks ran out of attempts.
    pub async fn dead(&self) -> Vec<RecordId> {
        self.state.lock().await.dead.clone()
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn submit(&self, record_id: RecordId) -> Result<(), HeraldError> {
        let mut state = self.state.lock().await;
        if !state.queued.insert(record_id) {
            return Ok(());
        }
        state.next_id += 1;
        let id = state.next_id;
        state.waiting.push_back(QueuedTask {
            id,
            record_id,
            attempts: 0,
        });
        Ok(())
    }
}

#[async_trait]
impl TaskSource for MemoryQueue {
    async fn next_task(&self) -> Result<Option<QueuedTask>, HeraldError> {
        Ok(self.state.lock().await.waiting.pop_front())
    }

    async fn complete(&self, task: &QueuedTask) -> Result<(), HeraldError> {
        let mut state = self.state.lock().await;
        state.queued.remove(&task.record_id);
        state.completed.push(task.record_id);
        Ok(())
    }

    async fn fail(&self, task: &QueuedTask) -> Result<(), HeraldError> {
        let mut state = self.state.lock().await;
        let attempts = task.attempts + 1;
        if attempts >= MAX_ATTEMPTS {
            state.queued.remove(&task.record_id);
            state.dead.push(task.record_id);
        } else {
            state.waiting.push_back(QueuedTask {
                attempts,
                ..task.clone()
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_tasks_retry_then_die() {
        let queue = MemoryQueue::new();
        queue.submit(9).await.unwrap();

        for _ in 0..MAX_ATTEMPTS {
            let task = queue.next_task().await.unwrap().unwrap();
            queue.fail(&task).await.unwrap();
        }
        assert!(queue.next_task().await.unwrap().is_none());
        assert_eq!(queue.dead().await, vec![9]);
    }

    #[tokio::test]
    async fn duplicate_submit_is_ignored_while_queued() {
        let queue = MemoryQueue::new();
        queue.submit(4).await.unwrap();
        queue.submit(4).await.unwrap();
        assert_eq!(queue.waiting().await, vec![4]);

        let task = queue.next_task().await.unwrap().unwrap();
        queue.submit(4).await.unwrap();
        assert!(queue.waiting().await.is_empty());

        queue.complete(&task).await.unwrap();
        queue.submit(4).await.unwrap();
        assert_eq!(queue.waiting().await, vec![4]);
    }
}
