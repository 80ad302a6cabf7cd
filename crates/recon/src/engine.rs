use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::aggregate::aggregate_records;
use crate::coerce::{coerce, Coerced};
use crate::config::ReconConfig;
use crate::difference::{compute_differences, Materiality};
use crate::error::ReconError;
use crate::join::join_accounts;
use crate::model::{
    BalanceKind, Balances, KeyedRecord, Presence, ReconInput, ReconMeta, ReconResult,
    SourceDiagnostics, SourceSide,
};
use crate::normalize::KeyNormalizer;
use crate::shape::ReportTable;
use crate::summary::compute_summary;
use crate::translate::{build_translation, TranslationTable};

/// Build the run's DE-PARA table, or an empty one when the config has none.
///
/// `csv_data` is the content of `translation.file`, when the config names one.
pub fn load_translation(
    config: &ReconConfig,
    csv_data: Option<&str>,
) -> Result<TranslationTable, ReconError> {
    match config.translation {
        Some(ref translation) => {
            build_translation(translation, csv_data, &KeyNormalizer::new(&config.key))
        }
        None => Ok(TranslationTable::default()),
    }
}

/// Run reconciliation per config. Returns reconciled rows, report and summary.
pub fn run(
    config: &ReconConfig,
    input: &ReconInput,
    translation: &TranslationTable,
) -> Result<ReconResult, ReconError> {
    let normalizer = KeyNormalizer::new(&config.key);
    let materiality = Materiality::new(config.materiality_threshold);

    let mut diagnostics: BTreeMap<&str, SourceDiagnostics> = config
        .sources
        .iter()
        .map(|(name, source)| (name.as_str(), SourceDiagnostics::new(name, source.side)))
        .collect();

    let mut accounting_rows = Vec::new();
    let mut statement_rows = Vec::new();

    for record in &input.records {
        let source = config.sources.get(&record.source).ok_or_else(|| {
            ReconError::ConfigValidation(format!(
                "record from unknown source '{}'",
                record.source
            ))
        })?;
        if source.side != record.side {
            return Err(ReconError::ConfigValidation(format!(
                "source '{}' is configured as {} but a record says {}",
                record.source, source.side, record.side
            )));
        }
        let diag = diagnostics
            .get_mut(record.source.as_str())
            .ok_or_else(|| ReconError::ConfigValidation(format!("unknown source '{}'", record.source)))?;
        diag.rows_read += 1;

        let mut key = normalizer.normalize(record.raw_account.as_deref());
        match key {
            Some(_) => diag.keyed += 1,
            None => {
                diag.unkeyed += 1;
                warn!(
                    source = %record.source,
                    row = record.row_number,
                    raw = record.raw_account.as_deref().unwrap_or(""),
                    "account identifier has no digits; row excluded from matching"
                );
            }
        }

        if record.side == SourceSide::Accounting {
            if let Some(old) = key.take() {
                let new = translation.translate(&old);
                if new != old {
                    diag.translated += 1;
                    debug!(source = %record.source, row = record.row_number, %old, %new, "account translated");
                }
                key = Some(new);
            }
        }

        let mut balances = Balances::zero();
        for kind in BalanceKind::ALL {
            let Some(raw) = record.balances.get(&kind) else {
                continue;
            };
            match coerce(raw, source.coercion) {
                Coerced::Value(v) => balances.add(kind, v),
                Coerced::Blank => diag.blank_cells += 1,
                Coerced::Unparsable => {
                    diag.coerced_to_zero += 1;
                    debug!(
                        source = %record.source,
                        row = record.row_number,
                        %kind,
                        raw = %raw,
                        "unparsable balance treated as zero"
                    );
                }
            }
        }

        // No label column: left blank, the report indexes the row by key.
        let label = record.label.as_deref().map(str::trim).unwrap_or_default().to_string();

        let keyed = KeyedRecord {
            source: record.source.clone(),
            row_number: record.row_number,
            key,
            label,
            balances,
        };
        match record.side {
            SourceSide::Accounting => accounting_rows.push(keyed),
            SourceSide::Statement => statement_rows.push(keyed),
        }
    }

    let accounting = aggregate_records(SourceSide::Accounting, &accounting_rows);
    let statement = aggregate_records(SourceSide::Statement, &statement_rows);

    let rows: Vec<_> = join_accounts(&accounting.accounts, &statement.accounts, config.join_mode)
        .into_iter()
        .map(|row| compute_differences(row, &materiality))
        .collect();

    if !accounting.accounts.is_empty()
        && !statement.accounts.is_empty()
        && !rows.iter().any(|r| r.presence == Presence::Both)
    {
        warn!(
            accounting_keys = accounting.accounts.len(),
            statement_keys = statement.accounts.len(),
            width = normalizer.width(),
            style = %normalizer.style(),
            "no account keys in common; check key width, style and domicile segment"
        );
    }

    let diagnostics: Vec<SourceDiagnostics> = diagnostics.into_values().collect();
    let summary = compute_summary(&rows, &diagnostics);
    let report = ReportTable::from_rows(&rows, config.output.sort);

    info!(
        join_mode = %config.join_mode,
        rows = summary.total_rows,
        matched = summary.matched,
        divergent = summary.divergent,
        unkeyed = summary.unkeyed_rows,
        "reconciliation complete"
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            join_mode: config.join_mode,
            key_width: normalizer.width(),
            key_style: normalizer.style(),
            materiality_threshold: materiality.threshold(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        diagnostics,
        rows,
        report,
    })
}
