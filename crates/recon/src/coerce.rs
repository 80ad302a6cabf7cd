use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

/// How a source writes its balance cells. Chosen per source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum CoercionStyle {
    /// `"1.234,56"`: '.' groups thousands, ',' marks decimals.
    LocaleDecimal,
    /// Every non-digit is noise; the digit string is divided by `scale`.
    IntegerCents {
        #[serde(default = "default_scale")]
        scale: u32,
    },
}

fn default_scale() -> u32 {
    100
}

/// Outcome of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced {
    Value(Decimal),
    /// Empty cell.
    Blank,
    /// Text that does not read as an amount.
    Unparsable,
}

impl Coerced {
    /// Blank and unparsable cells count as zero.
    pub fn value(&self) -> Decimal {
        match self {
            Self::Value(v) => *v,
            Self::Blank | Self::Unparsable => Decimal::ZERO,
        }
    }
}

/// Largest magnitude read as an amount (one quadrillion). Sums and differences
/// of cells within this bound stay far inside `Decimal` range.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_000_i64)
}

/// Coerce a currency-formatted cell. Never fails.
///
/// Amounts beyond [`max_amount`] are unparsable: no real balance reaches
/// them, and adding two of them could overflow.
pub fn coerce(raw: &str, style: CoercionStyle) -> Coerced {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Blank;
    }
    let coerced = match style {
        CoercionStyle::LocaleDecimal => parse_locale_decimal(trimmed),
        CoercionStyle::IntegerCents { scale } => parse_integer_cents(trimmed, scale),
    };
    match coerced {
        Coerced::Value(v) if v.abs() > max_amount() => Coerced::Unparsable,
        other => other,
    }
}

/// Parse `"1.234,56"`, `"R$ -1.234,56"`, `"(1.234,56)"` and `"1.234,56-"`.
fn parse_locale_decimal(s: &str) -> Coerced {
    let (paren_negative, inner) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    let inner = inner.trim();
    let inner = inner
        .strip_prefix("R$")
        .or_else(|| inner.strip_prefix('$'))
        .unwrap_or(inner);

    let mut cleaned: String = inner
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    // Trailing minus, as some ledger exports write debits.
    let mut negative = paren_negative;
    if cleaned.len() > 1 && cleaned.ends_with('-') && !cleaned.starts_with('-') {
        cleaned.pop();
        negative = !negative;
    }
    if let Some(rest) = cleaned.strip_prefix('-') {
        if paren_negative {
            return Coerced::Unparsable;
        }
        cleaned = rest.to_string();
        negative = !negative;
    }

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Coerced::Unparsable;
    }

    match Decimal::from_str(&cleaned) {
        Ok(v) if negative => Coerced::Value(-v),
        Ok(v) => Coerced::Value(v),
        Err(_) => Coerced::Unparsable,
    }
}

fn parse_integer_cents(s: &str, scale: u32) -> Coerced {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Coerced::Unparsable;
    }
    let Ok(units) = Decimal::from_str(&digits) else {
        return Coerced::Unparsable;
    };
    match units.checked_div(Decimal::from(scale)) {
        Some(v) => Coerced::Value(v),
        None => Coerced::Unparsable,
    }
}
