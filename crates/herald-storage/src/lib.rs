// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Herald.
//!
//! Message records and the dispatch queue live in one WAL-mode database with
//! embedded migrations. All statements run on the single `tokio-rusqlite`
//! connection thread, which is what makes the PENDING claim atomic.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod task_queue;

pub use adapter::SqliteStore;
pub use database::Database;
pub use models::*;
pub use task_queue::SqliteTaskQueue;
