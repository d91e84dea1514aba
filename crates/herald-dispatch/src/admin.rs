// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator actions over stored records.

use herald_core::{HeraldError, MessageRecord, MessageStatus, RecordFilter, RecordId};
use herald_registry::HandlerResolver;
use tracing::info;

use crate::dispatcher::{Claim, DispatchMode, Dispatcher};

/// Result of dispatching one selected record.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub id: RecordId,
    pub result: Result<MessageStatus, HeraldError>,
}

/// Per-record outcomes of a bulk dispatch, in selection order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn errors(&self) -> impl Iterator<Item = (RecordId, &HeraldError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.id, e)))
    }
}

/// Lists records for the operator view.
pub async fn list_records(
    dispatcher: &Dispatcher,
    filter: &RecordFilter,
) -> Result<Vec<MessageRecord>, HeraldError> {
    dispatcher.store().list(filter).await
}

/// Dispatches every selected record, continuing past failures.
///
/// Handlers are looked up once per action. A missing record is reported as
/// [`HeraldError::RecordNotFound`] in its outcome. [`Claim::Force`] also
/// takes records stuck in PENDING.
pub async fn dispatch_selected(
    dispatcher: &Dispatcher,
    ids: &[RecordId],
    mode: Option<DispatchMode>,
    claim: Claim,
) -> DispatchReport {
    let mut resolver = HandlerResolver::new(dispatcher.registry());
    let mut report = DispatchReport::default();

    for &id in ids {
        let result = match dispatcher.store().get(id).await {
            Ok(Some(record)) => dispatcher.dispatch_with(&mut resolver, &record, mode, claim).await,
            Ok(None) => Err(HeraldError::RecordNotFound { id }),
            Err(e) => Err(e),
        };
        report.outcomes.push(DispatchOutcome { id, result });
    }

    info!(
        selected = ids.len(),
        ?claim,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "bulk dispatch finished"
    );
    report
}
