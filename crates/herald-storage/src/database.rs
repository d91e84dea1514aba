// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: one `tokio-rusqlite` connection that serializes every
//! statement on its background thread.

use std::fmt::Display;
use std::path::Path;

use herald_core::HeraldError;
use tracing::{debug, info};

use crate::migrations;

/// Shared handle to the SQLite database. Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database in WAL mode and runs migrations.
    pub async fn open(path: &str) -> Result<Self, HeraldError> {
        Self::open_with(path, true).await
    }

    /// Opens the database, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, HeraldError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(HeraldError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(HeraldError::storage)?;

        let journal_mode = conn
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                let mode = if wal_mode { "WAL" } else { "DELETE" };
                conn.pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;

        conn.call(migrations::run_migrations)
            .await
            .map_err(map_call_err)?;

        info!(path, journal_mode = %journal_mode, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), HeraldError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Closes the connection. Every clone of this handle stops working.
    pub async fn close(&self) -> Result<(), HeraldError> {
        self.conn.clone().close().await.map_err(map_tr_err)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// Wraps a connection error as a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HeraldError {
    HeraldError::Storage {
        source: Box::new(e),
    }
}

/// Wraps a connection error whose closure failed with a non-rusqlite error.
pub(crate) fn map_call_err<E: Display>(e: tokio_rusqlite::Error<E>) -> HeraldError {
    HeraldError::Storage {
        source: e.to_string().into(),
    }
}
