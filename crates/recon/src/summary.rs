use crate::difference::round_cents;
use crate::model::{Balances, Presence, ReconSummary, ReconciledRow, RowStatus, SourceDiagnostics};

/// Compute summary statistics from reconciled rows and per-source diagnostics.
pub fn compute_summary(rows: &[ReconciledRow], diagnostics: &[SourceDiagnostics]) -> ReconSummary {
    let mut matched = 0;
    let mut divergent = 0;
    let mut both = 0;
    let mut accounting_only = 0;
    let mut statement_only = 0;
    let mut accounting_totals = Balances::zero();
    let mut statement_totals = Balances::zero();
    let mut difference_totals = Balances::zero();

    for r in rows {
        match r.status {
            RowStatus::Matched => matched += 1,
            RowStatus::Divergent => divergent += 1,
        }
        match r.presence {
            Presence::Both => both += 1,
            Presence::AccountingOnly => accounting_only += 1,
            Presence::StatementOnly => statement_only += 1,
        }
        accounting_totals.add_all(&r.accounting);
        statement_totals.add_all(&r.statement);
        difference_totals.add_all(&r.differences);
    }

    let rounded = |b: &Balances| -> Balances { b.iter().map(|(k, v)| (k, round_cents(v))).collect() };

    ReconSummary {
        total_rows: rows.len(),
        matched,
        divergent,
        both,
        accounting_only,
        statement_only,
        unkeyed_rows: diagnostics.iter().map(|d| d.unkeyed).sum(),
        coerced_to_zero: diagnostics.iter().map(|d| d.coerced_to_zero).sum(),
        accounting_totals: rounded(&accounting_totals),
        statement_totals: rounded(&statement_totals),
        difference_totals: rounded(&difference_totals),
    }
}
