use crate::config::{DomicileFormat, KeyConfig, KeyStyle};
use crate::model::CanonicalKey;

/// Literals spreadsheet exports write into empty identifier cells.
const NULL_SENTINELS: [&str; 3] = ["nan", "none", "null"];

/// Reduces raw account identifiers to canonical keys.
///
/// One normalizer serves every source of a run, so padded and stripped keys
/// can never meet in the same join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNormalizer {
    width: usize,
    style: KeyStyle,
    domicile: Option<DomicileFormat>,
}

impl KeyNormalizer {
    pub fn new(config: &KeyConfig) -> Self {
        Self {
            width: config.width,
            style: config.style,
            domicile: config.domicile.clone(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn style(&self) -> KeyStyle {
        self.style
    }

    /// Canonical key for `raw`, or `None` when it carries no digits.
    ///
    /// Keeps the last `width` digits, then pads or strips leading zeros per
    /// the configured style. An all-zero identifier under `Stripped` is `"0"`.
    pub fn normalize(&self, raw: Option<&str>) -> Option<CanonicalKey> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() || is_null_sentinel(trimmed) {
            return None;
        }

        let account_part = match self.domicile {
            Some(ref domicile) => domicile_segment(trimmed, domicile).unwrap_or(trimmed),
            None => trimmed,
        };

        let digits: Vec<char> = account_part.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }

        let tail = &digits[digits.len().saturating_sub(self.width)..];
        let key: String = match self.style {
            KeyStyle::Padded => {
                let mut padded = "0".repeat(self.width - tail.len());
                padded.extend(tail.iter());
                padded
            }
            KeyStyle::Stripped => {
                let stripped: String = tail.iter().skip_while(|c| **c == '0').collect();
                if stripped.is_empty() {
                    "0".to_string()
                } else {
                    stripped
                }
            }
        };

        Some(CanonicalKey::from_digits(key))
    }
}

fn is_null_sentinel(s: &str) -> bool {
    NULL_SENTINELS.iter().any(|n| s.eq_ignore_ascii_case(n))
}

/// The account segment of a composite identifier, if `raw` has that shape.
fn domicile_segment<'a>(raw: &'a str, domicile: &DomicileFormat) -> Option<&'a str> {
    let parts: Vec<&str> = raw.split(domicile.delimiter.as_str()).collect();
    if parts.len() < 2 {
        return None;
    }
    parts.get(domicile.segment).map(|s| s.trim())
}
