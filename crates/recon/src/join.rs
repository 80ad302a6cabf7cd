use std::collections::BTreeMap;

use crate::config::JoinMode;
use crate::model::{AggregatedAccount, Balances, CanonicalKey, Presence, ReconciledRow, RowStatus};

/// Merge accounting and statement aggregates on canonical key.
///
/// The side a key is missing from contributes zero balances. Rows come back
/// ordered by key with zero differences; `compute_differences` fills those in.
pub fn join_accounts(
    accounting: &[AggregatedAccount],
    statement: &[AggregatedAccount],
    mode: JoinMode,
) -> Vec<ReconciledRow> {
    let accounting_map: BTreeMap<&CanonicalKey, &AggregatedAccount> =
        accounting.iter().map(|a| (&a.key, a)).collect();
    let statement_map: BTreeMap<&CanonicalKey, &AggregatedAccount> =
        statement.iter().map(|a| (&a.key, a)).collect();

    let mut rows = Vec::new();

    for (key, acc) in &accounting_map {
        match statement_map.get(key) {
            Some(stmt) => rows.push(joined_row(key, Some(*acc), Some(*stmt))),
            None if mode != JoinMode::Inner => rows.push(joined_row(key, Some(*acc), None)),
            None => {}
        }
    }

    if mode == JoinMode::Outer {
        for (key, stmt) in &statement_map {
            if !accounting_map.contains_key(key) {
                rows.push(joined_row(key, None, Some(*stmt)));
            }
        }
        rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    rows
}

fn joined_row(
    key: &CanonicalKey,
    accounting: Option<&AggregatedAccount>,
    statement: Option<&AggregatedAccount>,
) -> ReconciledRow {
    let presence = match (accounting, statement) {
        (Some(_), Some(_)) => Presence::Both,
        (Some(_), None) => Presence::AccountingOnly,
        _ => Presence::StatementOnly,
    };

    let display_label = [accounting, statement]
        .into_iter()
        .flatten()
        .map(|a| a.display_label.as_str())
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .to_string();

    ReconciledRow {
        key: key.clone(),
        display_label,
        presence,
        accounting: accounting.map(|a| a.balances.clone()).unwrap_or_default(),
        statement: statement.map(|a| a.balances.clone()).unwrap_or_default(),
        differences: Balances::zero(),
        status: RowStatus::Matched,
        sources: [accounting, statement]
            .into_iter()
            .flatten()
            .flat_map(|a| a.sources.iter().cloned())
            .collect(),
    }
}
