//! Final report layout: two-level `(balance kind, metric)` columns indexed by
//! account label, every amount rounded to cents.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::difference::round_cents;
use crate::model::{BalanceKind, CanonicalKey, Presence, ReconciledRow, RowStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Key,
    Label,
    /// Largest absolute difference first.
    Difference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AccountingBalance,
    StatementBalance,
    Difference,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::AccountingBalance,
        Metric::StatementBalance,
        Metric::Difference,
    ];
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountingBalance => write!(f, "accounting_balance"),
            Self::StatementBalance => write!(f, "statement_balance"),
            Self::Difference => write!(f, "difference"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnKey {
    pub kind: BalanceKind,
    pub metric: Metric,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// Display label, or the key when the label is empty.
    pub index: String,
    pub key: CanonicalKey,
    pub presence: Presence,
    pub status: RowStatus,
    /// Source tags behind the row.
    pub sources: Vec<String>,
    /// One value per `ReportTable::columns` entry.
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTable {
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn from_rows(rows: &[ReconciledRow], sort: SortOrder) -> Self {
        let columns: Vec<ColumnKey> = BalanceKind::ALL
            .iter()
            .flat_map(|kind| Metric::ALL.iter().map(move |metric| ColumnKey { kind: *kind, metric: *metric }))
            .collect();

        let mut ordered: Vec<&ReconciledRow> = rows.iter().collect();
        match sort {
            SortOrder::Key => ordered.sort_by(|a, b| a.key.cmp(&b.key)),
            SortOrder::Label => ordered.sort_by(|a, b| {
                index_of(a).cmp(&index_of(b)).then_with(|| a.key.cmp(&b.key))
            }),
            SortOrder::Difference => ordered.sort_by(|a, b| {
                largest_difference(b)
                    .cmp(&largest_difference(a))
                    .then_with(|| a.key.cmp(&b.key))
            }),
        }

        let report_rows = ordered
            .into_iter()
            .map(|row| ReportRow {
                index: index_of(row),
                key: row.key.clone(),
                presence: row.presence,
                status: row.status,
                sources: row.sources.clone(),
                values: columns.iter().map(|c| round_cents(cell(row, *c))).collect(),
            })
            .collect();

        Self { columns, rows: report_rows }
    }

    /// Rounded value at `(row, kind, metric)`.
    pub fn value(&self, row: usize, kind: BalanceKind, metric: Metric) -> Option<Decimal> {
        let col = self.columns.iter().position(|c| c.kind == kind && c.metric == metric)?;
        self.rows.get(row)?.values.get(col).copied()
    }

    /// The two header rows of a flattened export: balance kinds over metrics.
    /// The first three columns (index, key, status) have an empty upper level.
    pub fn header_rows(&self) -> (Vec<String>, Vec<String>) {
        let mut upper = vec![String::new(); 3];
        let mut lower = vec!["account".to_string(), "key".to_string(), "status".to_string()];
        for c in &self.columns {
            upper.push(c.kind.business_name().to_string());
            lower.push(c.metric.to_string());
        }
        (upper, lower)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn index_of(row: &ReconciledRow) -> String {
    let label = row.display_label.trim();
    if label.is_empty() {
        row.key.to_string()
    } else {
        label.to_string()
    }
}

fn cell(row: &ReconciledRow, column: ColumnKey) -> Decimal {
    match column.metric {
        Metric::AccountingBalance => row.accounting.get(column.kind),
        Metric::StatementBalance => row.statement.get(column.kind),
        Metric::Difference => row.differences.get(column.kind),
    }
}

fn largest_difference(row: &ReconciledRow) -> Decimal {
    row.differences
        .iter()
        .map(|(_, d)| d.abs())
        .max()
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difference::{compute_differences, Materiality};
    use crate::model::Balances;
    use rust_decimal_macros::dec;

    fn row(key: &str, label: &str, acc: Decimal, stmt: Decimal) -> ReconciledRow {
        let mut accounting = Balances::zero();
        accounting.set(BalanceKind::Current, acc);
        let mut statement = Balances::zero();
        statement.set(BalanceKind::Current, stmt);
        compute_differences(
            ReconciledRow {
                key: CanonicalKey::from_digits(key.into()),
                display_label: label.into(),
                presence: Presence::Both,
                accounting,
                statement,
                differences: Balances::zero(),
                status: RowStatus::Matched,
                sources: vec!["ledger".into(), "bb".into()],
            },
            &Materiality::default(),
        )
    }

    #[test]
    fn two_level_columns() {
        let table = ReportTable::from_rows(&[], SortOrder::Key);
        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.columns[0], ColumnKey { kind: BalanceKind::Current, metric: Metric::AccountingBalance });
        assert_eq!(table.columns[5], ColumnKey { kind: BalanceKind::Invested, metric: Metric::Difference });

        let (upper, lower) = table.header_rows();
        assert_eq!(upper.len(), 9);
        assert_eq!(upper[3], "Conta Movimento");
        assert_eq!(upper[8], "Aplicação Financeira");
        assert_eq!(lower[..4], ["account", "key", "status", "accounting_balance"]);
        assert!(table.is_empty());
    }

    #[test]
    fn values_rounded_once_at_output() {
        let rows = vec![row("0000001", "Matriz", dec!(0.006), dec!(0.004))];
        let table = ReportTable::from_rows(&rows, SortOrder::Key);
        assert_eq!(table.value(0, BalanceKind::Current, Metric::AccountingBalance), Some(dec!(0.01)));
        assert_eq!(table.value(0, BalanceKind::Current, Metric::StatementBalance), Some(dec!(0.00)));
        // round(0.006 - 0.004), not round(0.006) - round(0.004).
        assert_eq!(table.value(0, BalanceKind::Current, Metric::Difference), Some(dec!(0.00)));

        let rows = vec![row("0000001", "Matriz", dec!(1.006), dec!(0.001))];
        let table = ReportTable::from_rows(&rows, SortOrder::Key);
        assert_eq!(table.value(0, BalanceKind::Current, Metric::Difference), Some(dec!(1.01)));
    }

    #[test]
    fn index_falls_back_to_key() {
        let rows = vec![row("0000001", "", dec!(1), dec!(1))];
        let table = ReportTable::from_rows(&rows, SortOrder::Key);
        assert_eq!(table.rows[0].index, "0000001");
    }

    #[test]
    fn sort_orders() {
        let rows = vec![
            row("0000003", "Alfa", dec!(10), dec!(10)),
            row("0000001", "Gama", dec!(10), dec!(5)),
            row("0000002", "Beta", dec!(10), dec!(30)),
        ];
        let by = |sort| -> Vec<String> {
            ReportTable::from_rows(&rows, sort).rows.iter().map(|r| r.index.clone()).collect()
        };
        assert_eq!(by(SortOrder::Key), vec!["Gama", "Beta", "Alfa"]);
        assert_eq!(by(SortOrder::Label), vec!["Alfa", "Beta", "Gama"]);
        assert_eq!(by(SortOrder::Difference), vec!["Beta", "Gama", "Alfa"]);
    }

    #[test]
    fn missing_cell_is_none() {
        let table = ReportTable::from_rows(&[], SortOrder::Key);
        assert_eq!(table.value(0, BalanceKind::Current, Metric::Difference), None);
    }
}
