use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coerce::CoercionStyle;
use crate::error::ReconError;
use crate::model::{BalanceKind, SourceSide};
use crate::shape::SortOrder;

/// Widest key any source format has been seen to need, with headroom.
pub const MAX_KEY_WIDTH: usize = 32;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Required: INNER and OUTER reach different audit conclusions from the
    /// same inputs, so the run must say which one it wants.
    pub join_mode: JoinMode,
    #[serde(default = "default_threshold")]
    pub materiality_threshold: Decimal,
    pub key: KeyConfig,
    /// Ordered by source name; first-seen labels follow this order.
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub translation: Option<TranslationConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_threshold() -> Decimal {
    Decimal::new(1, 2)
}

// ---------------------------------------------------------------------------
// Join mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Only keys present on both sides.
    Inner,
    /// Every key from either side; orphans flagged.
    Outer,
    /// Every accounting key.
    Left,
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inner => write!(f, "inner"),
            Self::Outer => write!(f, "outer"),
            Self::Left => write!(f, "left"),
        }
    }
}

impl std::str::FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "outer" => Ok(Self::Outer),
            "left" => Ok(Self::Left),
            other => Err(format!("unknown join mode '{other}' (expected inner, outer or left)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Key rules shared by every source of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyConfig {
    pub width: usize,
    pub style: KeyStyle,
    #[serde(default)]
    pub domicile: Option<DomicileFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStyle {
    /// Left-pad to exactly `width` digits.
    Padded,
    /// Drop leading zeros.
    Stripped,
}

impl std::fmt::Display for KeyStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Padded => write!(f, "padded"),
            Self::Stripped => write!(f, "stripped"),
        }
    }
}

/// Composite "bank domicile" identifiers such as `"001 - 3456 - 12345-6"`,
/// where the account number is one positional segment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DomicileFormat {
    pub delimiter: String,
    /// Zero-based segment holding the account number.
    pub segment: usize,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub side: SourceSide,
    pub file: String,
    /// Sniffed from the first lines when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Preamble lines before the header row.
    #[serde(default)]
    pub skip_rows: usize,
    pub columns: ColumnMapping,
    pub coercion: CoercionStyle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    pub account: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub invested: Option<String>,
}

impl ColumnMapping {
    pub fn balance_column(&self, kind: BalanceKind) -> Option<&str> {
        match kind {
            BalanceKind::Current => self.current.as_deref(),
            BalanceKind::Invested => self.invested.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Translation (DE-PARA) + output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_old_column")]
    pub old_column: String,
    #[serde(default = "default_new_column")]
    pub new_column: String,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub entries: Vec<TranslationEntryConfig>,
}

fn default_old_column() -> String {
    "old".into()
}

fn default_new_column() -> String {
    "new".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslationEntryConfig {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub sort: SortOrder,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.key.width == 0 || self.key.width > MAX_KEY_WIDTH {
            return Err(ReconError::ConfigValidation(format!(
                "key width must be between 1 and {MAX_KEY_WIDTH}, got {}",
                self.key.width
            )));
        }

        if let Some(ref domicile) = self.key.domicile {
            if domicile.delimiter.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "key.domicile.delimiter must not be empty".into(),
                ));
            }
        }

        if self.materiality_threshold.is_sign_negative() {
            return Err(ReconError::ConfigValidation(format!(
                "materiality_threshold must not be negative, got {}",
                self.materiality_threshold
            )));
        }

        for side in [SourceSide::Accounting, SourceSide::Statement] {
            if !self.sources.values().any(|s| s.side == side) {
                return Err(ReconError::ConfigValidation(format!(
                    "at least one {side} source is required"
                )));
            }
        }

        for (name, source) in &self.sources {
            if source.columns.account.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}': columns.account must not be empty"
                )));
            }
            if BalanceKind::ALL
                .iter()
                .all(|k| source.columns.balance_column(*k).is_none())
            {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}': map at least one balance column (current or invested)"
                )));
            }
            if let Some(d) = source.delimiter {
                if !d.is_ascii() {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{name}': delimiter must be a single ASCII character"
                    )));
                }
            }
            if let CoercionStyle::IntegerCents { scale } = source.coercion {
                if scale == 0 {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{name}': integer_cents scale must be positive"
                    )));
                }
            }
        }

        if let Some(ref translation) = self.translation {
            if translation.file.is_none() && translation.entries.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "translation needs a file or at least one entry".into(),
                ));
            }
            if matches!(translation.delimiter, Some(d) if !d.is_ascii()) {
                return Err(ReconError::ConfigValidation(
                    "translation.delimiter must be a single ASCII character".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
