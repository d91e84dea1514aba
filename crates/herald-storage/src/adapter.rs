// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`MessageStore`].

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use herald_config::model::StorageConfig;
use herald_core::{
    HeraldError, MessageRecord, MessageStatus, MessageStore, NewMessageRecord, RecordFilter,
    RecordId,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed message store.
///
/// The database is opened lazily by [`SqliteStore::initialize`]; every other
/// call fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already opened database.
    pub fn with_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), HeraldError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HeraldError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite message store initialized");
        Ok(())
    }

    /// The underlying database, shared with the task queue.
    pub fn database(&self) -> Result<&Database, HeraldError> {
        self.db.get().ok_or_else(|| HeraldError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Checkpoints the WAL. The connection stays usable by other clones.
    pub async fn close(&self) -> Result<(), HeraldError> {
        self.database()?.checkpoint().await
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn insert(&self, record: &NewMessageRecord) -> Result<MessageRecord, HeraldError> {
        queries::messages::insert(self.database()?, record).await
    }

    async fn get(&self, id: RecordId) -> Result<Option<MessageRecord>, HeraldError> {
        queries::messages::get(self.database()?, id).await
    }

    async fn set_status(&self, id: RecordId, status: MessageStatus) -> Result<(), HeraldError> {
        queries::messages::set_status(self.database()?, id, status).await
    }

    async fn claim(&self, id: RecordId) -> Result<(), HeraldError> {
        queries::messages::claim(self.database()?, id).await
    }

    async fn reclaim(&self, id: RecordId) -> Result<(), HeraldError> {
        queries::messages::reclaim(self.database()?, id).await
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<MessageRecord>, HeraldError> {
        queries::messages::list(self.database()?, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("herald.db").display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(config(&dir));
        assert!(matches!(store.get(1).await, Err(HeraldError::Storage { .. })));
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(config(&dir));
        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
        store.close().await.unwrap();
    }
}
