use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{JoinMode, KeyStyle};
use crate::shape::ReportTable;

// ---------------------------------------------------------------------------
// Balance kinds + sides
// ---------------------------------------------------------------------------

/// The two tracked balance categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    /// "Conta Movimento"
    Current,
    /// "Aplicação Financeira"
    Invested,
}

impl BalanceKind {
    pub const ALL: [BalanceKind; 2] = [BalanceKind::Current, BalanceKind::Invested];

    /// Name used on report headers.
    pub fn business_name(&self) -> &'static str {
        match self {
            Self::Current => "Conta Movimento",
            Self::Invested => "Aplicação Financeira",
        }
    }
}

impl std::fmt::Display for BalanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Invested => write!(f, "invested"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSide {
    Accounting,
    Statement,
}

impl std::fmt::Display for SourceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accounting => write!(f, "accounting"),
            Self::Statement => write!(f, "statement"),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys + balances
// ---------------------------------------------------------------------------

/// Normalized digit string used to join rows across sources.
///
/// Only `KeyNormalizer` constructs these, so every key in a run shares one
/// width and one padding style. Keys keep the last N digits of the raw
/// identifier: two different accounts sharing those trailing digits collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub(crate) fn from_digits(digits: String) -> Self {
        debug_assert!(digits.chars().all(|c| c.is_ascii_digit()));
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One amount per balance kind. Kinds never set read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<BalanceKind, Decimal>);

impl Balances {
    pub fn zero() -> Self {
        Self(BalanceKind::ALL.iter().map(|k| (*k, Decimal::ZERO)).collect())
    }

    pub fn get(&self, kind: BalanceKind) -> Decimal {
        self.0.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, kind: BalanceKind, amount: Decimal) {
        self.0.insert(kind, amount);
    }

    pub fn add(&mut self, kind: BalanceKind, amount: Decimal) {
        *self.0.entry(kind).or_insert(Decimal::ZERO) += amount;
    }

    pub fn add_all(&mut self, other: &Balances) {
        for kind in BalanceKind::ALL {
            self.add(kind, other.get(kind));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BalanceKind, Decimal)> + '_ {
        BalanceKind::ALL.into_iter().map(|k| (k, self.get(k)))
    }
}

impl Default for Balances {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromIterator<(BalanceKind, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (BalanceKind, Decimal)>>(iter: I) -> Self {
        let mut balances = Self::zero();
        for (kind, amount) in iter {
            balances.add(kind, amount);
        }
        balances
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single parsed row from any source, before normalization and coercion.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Source tag (config source name, e.g. "ledger", "bb", "cef").
    pub source: String,
    pub side: SourceSide,
    /// 1-based data row within the source file.
    pub row_number: usize,
    pub raw_account: Option<String>,
    pub label: Option<String>,
    /// Currency-formatted strings; kinds the source does not carry are absent.
    pub balances: BTreeMap<BalanceKind, String>,
}

/// Pre-loaded records from every source of one run.
#[derive(Debug, Default)]
pub struct ReconInput {
    pub records: Vec<RawRecord>,
}

/// A record after key normalization, translation and coercion.
#[derive(Debug, Clone)]
pub struct KeyedRecord {
    pub source: String,
    pub row_number: usize,
    pub key: Option<CanonicalKey>,
    pub label: String,
    pub balances: Balances,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// All records of one side sharing a canonical key, summed per kind.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedAccount {
    pub side: SourceSide,
    pub key: CanonicalKey,
    /// Label of the first record for this key that has one.
    pub display_label: String,
    pub balances: Balances,
    /// Source tags that contributed, in first-seen order.
    pub sources: Vec<String>,
}

#[derive(Debug)]
pub struct AggregateOutput {
    pub accounts: Vec<AggregatedAccount>,
    /// Records excluded because their identifier had no digits.
    pub unkeyed: usize,
}

// ---------------------------------------------------------------------------
// Join + differences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    AccountingOnly,
    StatementOnly,
}

impl Presence {
    /// Operator-facing flag for orphan rows.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Both => "found in both",
            Self::AccountingOnly => "found only in accounting",
            Self::StatementOnly => "found only in statement",
        }
    }
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::AccountingOnly => write!(f, "accounting_only"),
            Self::StatementOnly => write!(f, "statement_only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Matched,
    Divergent,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Divergent => write!(f, "divergent"),
        }
    }
}

/// One joined account. Balances and differences are kept at full precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRow {
    pub key: CanonicalKey,
    pub display_label: String,
    pub presence: Presence,
    pub accounting: Balances,
    pub statement: Balances,
    pub differences: Balances,
    pub status: RowStatus,
    /// Source tags behind the row: accounting first, then statement.
    pub sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Diagnostics, summary, output
// ---------------------------------------------------------------------------

/// Audit counters for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDiagnostics {
    pub source: String,
    pub side: SourceSide,
    pub rows_read: usize,
    pub keyed: usize,
    pub unkeyed: usize,
    pub translated: usize,
    pub blank_cells: usize,
    pub coerced_to_zero: usize,
}

impl SourceDiagnostics {
    pub fn new(source: &str, side: SourceSide) -> Self {
        Self {
            source: source.to_string(),
            side,
            rows_read: 0,
            keyed: 0,
            unkeyed: 0,
            translated: 0,
            blank_cells: 0,
            coerced_to_zero: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub total_rows: usize,
    pub matched: usize,
    pub divergent: usize,
    pub both: usize,
    pub accounting_only: usize,
    pub statement_only: usize,
    pub unkeyed_rows: usize,
    pub coerced_to_zero: usize,
    /// Column totals, rounded to cents.
    pub accounting_totals: Balances,
    pub statement_totals: Balances,
    pub difference_totals: Balances,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub join_mode: JoinMode,
    pub key_width: usize,
    pub key_style: KeyStyle,
    pub materiality_threshold: Decimal,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub diagnostics: Vec<SourceDiagnostics>,
    /// Full-precision rows; the serialized form is `report`.
    #[serde(skip)]
    pub rows: Vec<ReconciledRow>,
    pub report: ReportTable,
}
