// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot operator commands.

use herald_config::HeraldConfig;
use herald_core::{HeraldError, MessageRecord, RecordFilter, RecordId};
use herald_dispatch::{DispatchMode, list_records};

use crate::ListArgs;
use crate::bootstrap::{bootstrap, registry};

/// `herald dispatch <id> [--async] [--force]`.
pub async fn run_dispatch(
    config: HeraldConfig,
    id: RecordId,
    dispatch_async: bool,
    force: bool,
) -> Result<(), HeraldError> {
    let app = bootstrap(config).await?;
    let mode = Some(DispatchMode::from_async_flag(dispatch_async));
    let status = if force {
        app.dispatcher.redispatch_by_id(id, mode).await
    } else {
        app.dispatcher.dispatch_by_id(id, mode).await
    };
    app.store.close().await?;
    println!("message {id}: {}", status?);
    Ok(())
}

/// `herald list`.
pub async fn run_list(config: HeraldConfig, args: ListArgs) -> Result<(), HeraldError> {
    let app = bootstrap(config).await?;
    let filter = RecordFilter {
        kind: args.kind,
        status: args.status,
        language: args.language,
        created_after: args.created_after,
        created_before: args.created_before,
        modified_after: args.modified_after,
        modified_before: args.modified_before,
        search: args.search,
        limit: Some(args.limit),
    };
    let records = list_records(&app.dispatcher, &filter).await?;

    if args.json {
        let out = serde_json::to_string_pretty(&records)
            .map_err(|e| HeraldError::Internal(e.to_string()))?;
        println!("{out}");
    } else {
        for record in &records {
            println!("{}", format_row(record));
        }
    }
    Ok(())
}

fn format_row(record: &MessageRecord) -> String {
    format!(
        "{:>6}  {:<8} {:<24} {:<6} {}  {}",
        record.id,
        record.status,
        record.kind,
        record.language,
        record.created,
        record.recipients.join(", ")
    )
}

/// `herald handlers`: registered handlers in matching order.
pub fn run_handlers(config: &HeraldConfig) -> Result<(), HeraldError> {
    let (_, registry) = registry(config)?;
    if registry.is_empty() {
        println!("no handlers configured (set msg.handlers)");
    }
    for (name, entry) in registry.all() {
        let descriptor = &entry.descriptor;
        let fields: Vec<String> = descriptor
            .required()
            .iter()
            .filter_map(|field| descriptor.get(field).map(|value| format!("{field}={value}")))
            .collect();
        println!("{name}\t{}", fields.join(" "));
    }
    Ok(())
}

/// `herald config`: the validated effective configuration as TOML.
pub fn run_config(config: &HeraldConfig) -> Result<(), HeraldError> {
    let out = toml::to_string_pretty(config).map_err(|e| HeraldError::Config(e.to_string()))?;
    print!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use herald_core::MessageStatus;
    use serde_json::json;

    use super::*;

    #[test]
    fn row_lists_status_type_and_recipients() {
        let record = MessageRecord {
            id: 7,
            kind: "welcome".into(),
            status: MessageStatus::Error,
            language: "en".into(),
            recipients: vec!["a@example.com".into(), "b@example.com".into()],
            context: json!({}).as_object().cloned().unwrap(),
            created: "2026-01-01T00:00:00.000Z".into(),
            modified: "2026-01-01T00:00:00.000Z".into(),
        };
        let row = format_row(&record);
        assert!(row.contains("ERROR"));
        assert!(row.contains("welcome"));
        assert!(row.ends_with("a@example.com, b@example.com"));
    }

    #[test]
    fn config_prints_as_toml() {
        let config = herald_config::load_and_validate_str("[msg]\nskip_send = true\n").unwrap();
        run_config(&config).unwrap();
    }
}
