// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record persistence contract.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::{MessageRecord, MessageStatus, NewMessageRecord, RecordFilter, RecordId};

/// System of record for message dispatch history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts a new record with status NEW and returns it as stored.
    async fn insert(&self, record: &NewMessageRecord) -> Result<MessageRecord, HeraldError>;

    /// Fetches a record by id.
    async fn get(&self, id: RecordId) -> Result<Option<MessageRecord>, HeraldError>;

    /// Status-only update. Refreshes `modified`.
    async fn set_status(&self, id: RecordId, status: MessageStatus) -> Result<(), HeraldError>;

    /// Moves the record to PENDING if it is NEW, DONE, or ERROR.
    ///
    /// Fails with [`HeraldError::AlreadyPending`] if it is already PENDING and
    /// with [`HeraldError::RecordNotFound`] if it does not exist.
    async fn claim(&self, id: RecordId) -> Result<(), HeraldError>;

    /// Moves the record to PENDING from any status, PENDING included.
    ///
    /// Operator override for records left PENDING by an interrupted dispatch.
    async fn reclaim(&self, id: RecordId) -> Result<(), HeraldError>;

    /// Lists records matching the filter, newest first.
    async fn list(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, HeraldError>;
}
