use std::path::PathBuf;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use saldo_recon::config::{JoinMode, KeyConfig, KeyStyle, ReconConfig};
use saldo_recon::engine::{load_translation, run};
use saldo_recon::model::{BalanceKind, Presence, ReconInput, ReconResult, RowStatus};
use saldo_recon::normalize::KeyNormalizer;
use saldo_recon::shape::Metric;
use saldo_recon::source::load_csv_records;
use saldo_recon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> String {
    std::fs::read_to_string(fixtures_dir().join("recon.toml")).unwrap()
}

fn try_load_and_run(config_toml: &str) -> Result<ReconResult, ReconError> {
    let dir = fixtures_dir();
    let config = ReconConfig::from_toml(config_toml)?;

    let mut records = Vec::new();
    for (name, source) in &config.sources {
        let path = dir.join(&source.file);
        let csv_data = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
        records.extend(load_csv_records(name, &csv_data, source)?);
    }

    let translation_csv = config
        .translation
        .as_ref()
        .and_then(|t| t.file.as_ref())
        .map(|file| std::fs::read_to_string(dir.join(file)).unwrap());
    let translation = load_translation(&config, translation_csv.as_deref())?;

    run(&config, &ReconInput { records }, &translation)
}

fn load_and_run(config_toml: &str) -> ReconResult {
    try_load_and_run(config_toml).unwrap()
}

fn keys(result: &ReconResult) -> Vec<&str> {
    result.rows.iter().map(|r| r.key.as_str()).collect()
}

fn with_join_mode(toml: &str, mode: &str) -> String {
    toml.replacen("join_mode = \"outer\"", &format!("join_mode = \"{mode}\""), 1)
}

// -------------------------------------------------------------------------
// Fixture run
// -------------------------------------------------------------------------

#[test]
fn outer_run_over_fixtures() {
    let result = load_and_run(&fixture_config());

    assert_eq!(result.meta.join_mode, JoinMode::Outer);
    assert_eq!(
        keys(&result),
        vec!["0045678", "0088881", "0123456", "0310002", "0999999"]
    );

    let cef = &result.rows[0];
    assert_eq!(cef.presence, Presence::Both);
    assert_eq!(cef.display_label, "Filial Centro - CEF");
    assert_eq!(cef.differences.get(BalanceKind::Current), dec!(0.09));
    assert_eq!(cef.differences.get(BalanceKind::Invested), Decimal::ZERO);
    assert_eq!(cef.status, RowStatus::Divergent);

    let norte = &result.rows[1];
    assert_eq!(norte.presence, Presence::AccountingOnly);
    assert_eq!(norte.status, RowStatus::Matched);

    let matriz = &result.rows[2];
    assert_eq!(matriz.display_label, "Matriz - BB");
    assert_eq!(matriz.accounting.get(BalanceKind::Current), dec!(1750.25));
    assert_eq!(matriz.statement.get(BalanceKind::Current), dec!(1750.25));
    assert_eq!(matriz.statement.get(BalanceKind::Invested), dec!(10000));
    assert_eq!(matriz.status, RowStatus::Matched);
    assert_eq!(matriz.sources, vec!["ledger", "bb"]);

    let orphan = &result.rows[3];
    assert_eq!(orphan.presence, Presence::StatementOnly);
    assert_eq!(orphan.display_label, "");
    assert_eq!(orphan.sources, vec!["cef"]);
    assert_eq!(orphan.differences.get(BalanceKind::Current), dec!(-42));
    assert_eq!(orphan.status, RowStatus::Divergent);

    // Renumbered through the DE-PARA file.
    let renumbered = &result.rows[4];
    assert_eq!(renumbered.presence, Presence::Both);
    assert_eq!(renumbered.display_label, "Conta antiga BB");
    assert_eq!(renumbered.status, RowStatus::Matched);
}

#[test]
fn fixture_summary_and_diagnostics() {
    let result = load_and_run(&fixture_config());
    let s = &result.summary;

    assert_eq!(s.total_rows, 5);
    assert_eq!(s.matched, 3);
    assert_eq!(s.divergent, 2);
    assert_eq!(s.both, 3);
    assert_eq!(s.accounting_only, 1);
    assert_eq!(s.statement_only, 1);
    assert_eq!(s.unkeyed_rows, 1);
    assert_eq!(s.coerced_to_zero, 1);
    assert_eq!(s.accounting_totals.get(BalanceKind::Current), dec!(5061.24));
    assert_eq!(s.statement_totals.get(BalanceKind::Current), dec!(5103.15));
    assert_eq!(s.difference_totals.get(BalanceKind::Current), dec!(-41.91));
    assert_eq!(s.difference_totals.get(BalanceKind::Invested), Decimal::ZERO);

    let sources: Vec<&str> = result.diagnostics.iter().map(|d| d.source.as_str()).collect();
    assert_eq!(sources, vec!["bb", "cef", "ledger"]);

    let ledger = &result.diagnostics[2];
    assert_eq!(ledger.rows_read, 6);
    assert_eq!(ledger.keyed, 5);
    assert_eq!(ledger.unkeyed, 1);
    assert_eq!(ledger.translated, 1);
    assert_eq!(ledger.blank_cells, 1);
    assert_eq!(ledger.coerced_to_zero, 1);

    // Statement keys are never translated.
    assert_eq!(result.diagnostics[0].translated, 0);
}

#[test]
fn report_is_rounded_and_two_level() {
    let result = load_and_run(&fixture_config());
    let report = &result.report;

    assert_eq!(report.rows.len(), 5);
    assert_eq!(report.rows[0].index, "Filial Centro - CEF");
    // CEF carries no label column: the orphan is indexed by its key.
    assert_eq!(report.rows[3].index, "0310002");
    assert_eq!(report.rows[3].sources, vec!["cef"]);
    assert_eq!(
        report.value(0, BalanceKind::Current, Metric::Difference),
        Some(dec!(0.09))
    );
    assert_eq!(
        report.value(2, BalanceKind::Invested, Metric::StatementBalance),
        Some(dec!(10000.00))
    );

    let (upper, lower) = report.header_rows();
    assert_eq!(upper.len(), lower.len());
    assert_eq!(upper[3], "Conta Movimento");
    assert_eq!(lower[5], "difference");
}

// -------------------------------------------------------------------------
// Join modes
// -------------------------------------------------------------------------

#[test]
fn inner_is_subset_of_outer_and_left() {
    let toml = fixture_config();
    let outer = load_and_run(&toml);
    let inner = load_and_run(&with_join_mode(&toml, "inner"));
    let left = load_and_run(&with_join_mode(&toml, "left"));

    assert_eq!(keys(&inner), vec!["0045678", "0123456", "0999999"]);
    assert_eq!(keys(&left), vec!["0045678", "0088881", "0123456", "0999999"]);

    for key in keys(&inner) {
        assert!(keys(&outer).contains(&key));
        assert!(keys(&left).contains(&key));
    }
    assert!(inner.rows.iter().all(|r| r.presence == Presence::Both));
    assert!(left.rows.iter().all(|r| r.presence != Presence::StatementOnly));
}

#[test]
fn no_common_keys_gives_empty_inner_result() {
    let config = ReconConfig::from_toml(
        r#"
name = "disjoint"
join_mode = "inner"
[key]
width = 7
style = "padded"
[sources.ledger]
side = "accounting"
file = "a.csv"
[sources.ledger.columns]
account = "Conta"
current = "Saldo"
[sources.ledger.coercion]
style = "locale_decimal"
[sources.bank]
side = "statement"
file = "b.csv"
[sources.bank.columns]
account = "Conta"
current = "Saldo"
[sources.bank.coercion]
style = "locale_decimal"
"#,
    )
    .unwrap();
    let mut records =
        load_csv_records("ledger", "Conta;Saldo\n111;1,00\n", &config.sources["ledger"]).unwrap();
    records.extend(load_csv_records("bank", "Conta;Saldo\n222;1,00\n", &config.sources["bank"]).unwrap());

    let result = run(&config, &ReconInput { records }, &Default::default()).unwrap();
    assert!(result.rows.is_empty());
    assert!(result.report.is_empty());
    assert_eq!(result.summary.total_rows, 0);
}

// -------------------------------------------------------------------------
// Key width / truncation
// -------------------------------------------------------------------------

fn normalizer(width: usize, style: KeyStyle) -> KeyNormalizer {
    KeyNormalizer::new(&KeyConfig { width, style, domicile: None })
}

#[test]
fn same_account_different_formats_share_a_key() {
    let n = normalizer(7, KeyStyle::Padded);
    let ledger = n.normalize(Some("12.345-6")).unwrap();
    let bank = n.normalize(Some("0000123456")).unwrap();
    assert_eq!(ledger.as_str(), "0123456");
    assert_eq!(ledger, bank);
}

#[test]
fn trailing_check_digit_breaks_the_match() {
    // A bank export that appends an extra digit truncates to a different key.
    let n = normalizer(7, KeyStyle::Padded);
    let ledger = n.normalize(Some("12.345-6")).unwrap();
    let bank = n.normalize(Some("0001234560")).unwrap();
    assert_eq!(bank.as_str(), "1234560");
    assert_ne!(ledger, bank);
}

#[test]
fn different_accounts_sharing_trailing_digits_collide() {
    // Known limitation of last-N truncation.
    let n = normalizer(7, KeyStyle::Padded);
    assert_eq!(
        n.normalize(Some("9990123456")),
        n.normalize(Some("12.345-6"))
    );
    let wider = normalizer(10, KeyStyle::Padded);
    assert_ne!(
        wider.normalize(Some("9990123456")),
        wider.normalize(Some("12.345-6"))
    );
}

#[test]
fn without_domicile_segment_cef_keys_drift() {
    let toml = fixture_config().replace("[key.domicile]\ndelimiter = \" - \"\nsegment = 2\n", "");
    let result = load_and_run(&toml);

    // The agency digits leak into the key, so the CEF row no longer matches.
    let cef = result
        .rows
        .iter()
        .find(|r| r.key.as_str() == "8745678")
        .unwrap();
    assert_eq!(cef.presence, Presence::StatementOnly);
    let ledger_side = result
        .rows
        .iter()
        .find(|r| r.key.as_str() == "0045678")
        .unwrap();
    assert_eq!(ledger_side.presence, Presence::AccountingOnly);
}

#[test]
fn stripped_style_applies_to_every_source() {
    let toml = fixture_config().replace("style = \"padded\"", "style = \"stripped\"");
    let result = load_and_run(&toml);
    assert_eq!(
        keys(&result),
        vec!["123456", "310002", "45678", "88881", "999999"]
    );
    assert_eq!(result.summary.both, 3);
}

// -------------------------------------------------------------------------
// Aggregation
// -------------------------------------------------------------------------

#[test]
fn duplicate_rows_are_summed() {
    let result = load_and_run(&fixture_config());
    let matriz = result.rows.iter().find(|r| r.key.as_str() == "0123456").unwrap();
    // 1.500,00 + 250,25 from two ledger rows.
    assert_eq!(matriz.accounting.get(BalanceKind::Current), dec!(1500.00) + dec!(250.25));
    // Blank invested cell on the second row adds nothing.
    assert_eq!(matriz.accounting.get(BalanceKind::Invested), dec!(10000.00));
}

// -------------------------------------------------------------------------
// Errors
// -------------------------------------------------------------------------

#[test]
fn missing_mapped_column_is_fatal() {
    let toml = fixture_config().replace("current = \"Saldo Conta\"", "current = \"Saldo Corrente\"");
    let err = try_load_and_run(&toml).unwrap_err();
    match err {
        ReconError::MissingColumn { source, column } => {
            assert_eq!(source, "cef");
            assert_eq!(column, "Saldo Corrente");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn translation_column_mismatch_is_fatal() {
    let toml = fixture_config().replace("new_column = \"Conta Nova\"", "new_column = \"Nova\"");
    let err = try_load_and_run(&toml).unwrap_err();
    assert!(err.to_string().contains("'Nova'"), "{err}");
}

#[test]
fn materiality_threshold_changes_status() {
    let toml = fixture_config().replace("materiality_threshold = 0.01", "materiality_threshold = 0.10");
    let result = load_and_run(&toml);
    let cef = result.rows.iter().find(|r| r.key.as_str() == "0045678").unwrap();
    assert_eq!(cef.status, RowStatus::Matched);
    assert_eq!(result.meta.materiality_threshold, dec!(0.10));
}
