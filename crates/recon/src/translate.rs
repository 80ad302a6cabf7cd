//! DE-PARA: old-to-new account key cross-reference for renumbered accounts.

use std::collections::HashMap;

use crate::config::TranslationConfig;
use crate::error::ReconError;
use crate::model::CanonicalKey;
use crate::normalize::KeyNormalizer;
use crate::source::read_table;

/// One-step remapping of canonical keys. Keys without an entry pass through.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    map: HashMap<CanonicalKey, CanonicalKey>,
}

impl TranslationTable {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Build from raw `(old, new)` identifier pairs, normalized with the run's key rules.
    ///
    /// `origin` names where each pair came from, for error messages.
    pub fn from_pairs<'a, I>(pairs: I, normalizer: &KeyNormalizer) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (String, &'a str, &'a str)>,
    {
        let mut map: HashMap<CanonicalKey, CanonicalKey> = HashMap::new();

        for (origin, old_raw, new_raw) in pairs {
            let old = normalizer.normalize(Some(old_raw)).ok_or_else(|| {
                ReconError::Translation(format!("{origin}: old account '{old_raw}' has no digits"))
            })?;
            let new = normalizer.normalize(Some(new_raw)).ok_or_else(|| {
                ReconError::Translation(format!("{origin}: new account '{new_raw}' has no digits"))
            })?;

            if let Some(existing) = map.get(&old) {
                if *existing != new {
                    return Err(ReconError::Translation(format!(
                        "{origin}: account {old} already maps to {existing}, cannot also map to {new}"
                    )));
                }
                continue;
            }
            map.insert(old, new);
        }

        Ok(Self { map })
    }

    /// `table[key]` if present, else `key`. Applied once: the result is never
    /// looked up again, so `a -> b` and `b -> c` send `a` to `b`.
    pub fn translate(&self, key: &CanonicalKey) -> CanonicalKey {
        self.map.get(key).unwrap_or(key).clone()
    }
}

/// Build the DE-PARA table from the config's inline entries and, when the
/// config names a file, that file's contents.
pub fn build_translation(
    config: &TranslationConfig,
    csv_data: Option<&str>,
    normalizer: &KeyNormalizer,
) -> Result<TranslationTable, ReconError> {
    let mut pairs: Vec<(String, String, String)> = config
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| (format!("entry {}", i + 1), e.old.clone(), e.new.clone()))
        .collect();

    match (&config.file, csv_data) {
        (Some(file), Some(data)) => {
            let table = read_table("translation", data, config.delimiter, 0)?;
            let old_idx = table.column("translation", &config.old_column)?;
            let new_idx = table.column("translation", &config.new_column)?;
            for (i, record) in table.records.iter().enumerate() {
                let old = record.get(old_idx).unwrap_or("").trim();
                let new = record.get(new_idx).unwrap_or("").trim();
                if old.is_empty() && new.is_empty() {
                    continue;
                }
                pairs.push((format!("{file} row {}", i + 1), old.to_string(), new.to_string()));
            }
        }
        (Some(file), None) => {
            return Err(ReconError::Io(format!("translation file '{file}' was not loaded")));
        }
        (None, _) => {}
    }

    TranslationTable::from_pairs(
        pairs.iter().map(|(origin, old, new)| (origin.clone(), old.as_str(), new.as_str())),
        normalizer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyConfig, KeyStyle, TranslationEntryConfig};

    fn normalizer() -> KeyNormalizer {
        KeyNormalizer::new(&KeyConfig { width: 7, style: KeyStyle::Padded, domicile: None })
    }

    fn key(raw: &str) -> CanonicalKey {
        normalizer().normalize(Some(raw)).unwrap()
    }

    fn table(pairs: &[(&str, &str)]) -> Result<TranslationTable, ReconError> {
        TranslationTable::from_pairs(
            pairs.iter().enumerate().map(|(i, (o, n))| (format!("entry {i}"), *o, *n)),
            &normalizer(),
        )
    }

    #[test]
    fn translates_known_keys_only() {
        let t = table(&[("111", "222")]).unwrap();
        assert_eq!(t.translate(&key("111")), key("222"));
        assert_eq!(t.translate(&key("333")), key("333"));
    }

    #[test]
    fn entries_are_normalized() {
        let t = table(&[("00.011-1", "2-22")]).unwrap();
        assert_eq!(t.translate(&key("0000111")), key("0000222"));
    }

    #[test]
    fn no_transitive_remapping() {
        let t = table(&[("111", "222"), ("222", "333")]).unwrap();
        assert_eq!(t.translate(&key("111")), key("222"));
        assert_eq!(t.translate(&key("222")), key("333"));
    }

    #[test]
    fn identical_duplicates_accepted() {
        let t = table(&[("111", "222"), ("0000111", "222")]).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn conflicting_duplicates_rejected() {
        let err = table(&[("111", "222"), ("111", "333")]).unwrap_err();
        assert!(err.to_string().contains("already maps to 0000222"), "{err}");
    }

    #[test]
    fn unkeyable_entry_rejected() {
        let err = table(&[("n/a", "222")]).unwrap_err();
        assert!(err.to_string().contains("entry 0: old account 'n/a'"), "{err}");
    }

    #[test]
    fn build_from_file_and_entries() {
        let config = TranslationConfig {
            file: Some("depara.csv".into()),
            old_column: "Conta Antiga".into(),
            new_column: "Conta Nova".into(),
            delimiter: None,
            entries: vec![TranslationEntryConfig { old: "555".into(), new: "666".into() }],
        };
        let csv = "Conta Antiga;Conta Nova\n111;222\n;\n333;444\n";
        let t = build_translation(&config, Some(csv), &normalizer()).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.translate(&key("333")), key("444"));
        assert_eq!(t.translate(&key("555")), key("666"));
    }

    #[test]
    fn build_reports_missing_column() {
        let config = TranslationConfig {
            file: Some("depara.csv".into()),
            old_column: "old".into(),
            new_column: "new".into(),
            delimiter: Some(','),
            entries: Vec::new(),
        };
        let err = build_translation(&config, Some("old,novo\n1,2\n"), &normalizer()).unwrap_err();
        assert!(err.to_string().contains("missing column 'new'"), "{err}");
    }

    #[test]
    fn build_requires_loaded_file() {
        let config = TranslationConfig {
            file: Some("depara.csv".into()),
            old_column: "old".into(),
            new_column: "new".into(),
            delimiter: None,
            entries: Vec::new(),
        };
        assert!(build_translation(&config, None, &normalizer()).is_err());
    }
}
