use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{BalanceKind, Balances, ReconciledRow, RowStatus};

/// Decimal places of every reported amount.
pub const OUTPUT_DP: u32 = 2;

/// Round to cents, half away from zero, always carrying two decimal places.
/// Only applied at output and when testing materiality; sums stay at full
/// precision.
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(OUTPUT_DP, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(OUTPUT_DP);
    rounded
}

/// Minimum absolute (cent-rounded) difference that makes a row divergent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materiality {
    threshold: Decimal,
}

impl Materiality {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold: threshold.abs() }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Strict: a difference equal to the threshold is not material. The
    /// comparison uses the same rounded value the report shows.
    pub fn is_material(&self, difference: Decimal) -> bool {
        round_cents(difference).abs() > self.threshold
    }
}

impl Default for Materiality {
    fn default() -> Self {
        Self::new(Decimal::new(1, 2))
    }
}

/// `accounting - statement` per kind; positive means the ledger shows more
/// than the bank. Divergent when any kind's difference is material.
pub fn compute_differences(row: ReconciledRow, materiality: &Materiality) -> ReconciledRow {
    let differences: Balances = BalanceKind::ALL
        .iter()
        .map(|k| (*k, row.accounting.get(*k) - row.statement.get(*k)))
        .collect();

    let status = if differences.iter().any(|(_, d)| materiality.is_material(d)) {
        RowStatus::Divergent
    } else {
        RowStatus::Matched
    };

    ReconciledRow {
        differences,
        status,
        ..row
    }
}
