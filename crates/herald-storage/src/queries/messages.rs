// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record statements.

use herald_core::{
    HeraldError, MessageRecord, MessageStatus, NewMessageRecord, RecordFilter, RecordId,
};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, type, status, language, recipients, context, created, modified";

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let code: u8 = row.get(2)?;
    let status = MessageStatus::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Integer,
            format!("unknown message status {code}").into(),
        )
    })?;
    Ok(MessageRecord {
        id: row.get(0)?,
        kind: row.get(1)?,
        status,
        language: row.get(3)?,
        recipients: json_column(row, 4)?,
        context: json_column(row, 5)?,
        created: row.get(6)?,
        modified: row.get(7)?,
    })
}

/// Inserts a record with status NEW and returns it as stored.
pub async fn insert(
    db: &Database,
    record: &NewMessageRecord,
) -> Result<MessageRecord, HeraldError> {
    let recipients = serde_json::to_string(&record.recipients).map_err(HeraldError::storage)?;
    let context = serde_json::to_string(&record.context).map_err(HeraldError::storage)?;
    let kind = record.kind.clone();
    let language = record.language.clone();

    db.connection()
        .call(move |conn| -> rusqlite::Result<MessageRecord> {
            conn.execute(
                "INSERT INTO messages (type, status, language, recipients, context)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![kind, MessageStatus::New.code(), language, recipients, context],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                record_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches a record by id.
pub async fn get(db: &Database, id: RecordId) -> Result<Option<MessageRecord>, HeraldError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Status-only update that refreshes `modified`.
pub async fn set_status(
    db: &Database,
    id: RecordId,
    status: MessageStatus,
) -> Result<(), HeraldError> {
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET status = ?1,
                 modified = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status.code(), id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(HeraldError::RecordNotFound { id });
    }
    Ok(())
}

/// Moves a record to PENDING only from NEW, DONE, or ERROR.
///
/// The check and the update are one statement, so two callers racing on the
/// same record cannot both succeed.
pub async fn claim(db: &Database, id: RecordId) -> Result<(), HeraldError> {
    let claimable: Vec<u8> = MessageStatus::claimable().iter().map(|s| s.code()).collect();
    let (updated, current) = db
        .connection()
        .call(move |conn| -> rusqlite::Result<(usize, Option<u8>)> {
            let updated = conn.execute(
                "UPDATE messages SET status = ?1,
                 modified = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND status IN (?3, ?4, ?5)",
                params![
                    MessageStatus::Pending.code(),
                    id,
                    claimable[0],
                    claimable[1],
                    claimable[2]
                ],
            )?;
            let current: Option<u8> = if updated == 0 {
                conn.query_row(
                    "SELECT status FROM messages WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?
            } else {
                None
            };
            Ok((updated, current))
        })
        .await
        .map_err(map_tr_err)?;

    match (updated, current) {
        (0, None) => Err(HeraldError::RecordNotFound { id }),
        (0, Some(_)) => Err(HeraldError::AlreadyPending { id }),
        _ => Ok(()),
    }
}

/// Moves a record to PENDING whatever its status, PENDING included.
///
/// Operator recovery for records stranded in PENDING by a crash between
/// transitions. Unlike [`claim`] this does not exclude a concurrent sender.
pub async fn reclaim(db: &Database, id: RecordId) -> Result<(), HeraldError> {
    set_status(db, id, MessageStatus::Pending).await
}

/// `%search%` with LIKE wildcards in `search` matched literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds the WHERE clause and parameters for a filter.
fn filter_clause(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut push = |clause: &str, value: Value| {
        values.push(value);
        clauses.push(clause.replace('?', &format!("?{}", values.len())));
    };

    if let Some(kind) = &filter.kind {
        push("type = ?", Value::Text(kind.clone()));
    }
    if let Some(status) = filter.status {
        push("status = ?", Value::Integer(status.code().into()));
    }
    if let Some(language) = &filter.language {
        push("language = ?", Value::Text(language.clone()));
    }
    if let Some(after) = &filter.created_after {
        push("created >= ?", Value::Text(after.clone()));
    }
    if let Some(before) = &filter.created_before {
        push("created <= ?", Value::Text(before.clone()));
    }
    if let Some(after) = &filter.modified_after {
        push("modified >= ?", Value::Text(after.clone()));
    }
    if let Some(before) = &filter.modified_before {
        push("modified <= ?", Value::Text(before.clone()));
    }
    if let Some(search) = &filter.search {
        push(
            "(type LIKE ? ESCAPE '\\' OR recipients LIKE ? ESCAPE '\\')",
            Value::Text(like_pattern(search)),
        );
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

/// Lists records matching the filter, newest first.
pub async fn list(db: &Database, filter: &RecordFilter) -> Result<Vec<MessageRecord>, HeraldError> {
    let (clause, mut values) = filter_clause(filter);
    let mut sql = format!("SELECT {COLUMNS} FROM messages{clause} ORDER BY created DESC, id DESC");
    if let Some(limit) = filter.limit {
        values.push(Value::Integer(limit));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<MessageRecord>> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), record_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}
