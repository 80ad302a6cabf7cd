use std::collections::BTreeMap;

use crate::model::{AggregateOutput, AggregatedAccount, Balances, CanonicalKey, KeyedRecord, SourceSide};

/// Group one side's records by canonical key and sum each balance kind.
///
/// The label comes from the first record per key that has one. Records without
/// a key are left out and counted. Output is ordered by key.
pub fn aggregate_records(side: SourceSide, rows: &[KeyedRecord]) -> AggregateOutput {
    let mut groups: BTreeMap<CanonicalKey, AggregatedAccount> = BTreeMap::new();
    let mut unkeyed = 0;

    for row in rows {
        let Some(ref key) = row.key else {
            unkeyed += 1;
            continue;
        };

        let entry = groups.entry(key.clone()).or_insert_with(|| AggregatedAccount {
            side,
            key: key.clone(),
            display_label: row.label.clone(),
            balances: Balances::zero(),
            sources: Vec::new(),
        });
        if entry.display_label.trim().is_empty() {
            entry.display_label = row.label.clone();
        }
        entry.balances.add_all(&row.balances);
        if !entry.sources.contains(&row.source) {
            entry.sources.push(row.source.clone());
        }
    }

    AggregateOutput {
        accounts: groups.into_values().collect(),
        unkeyed,
    }
}
