//! `saldo run|validate|keys`: config-driven ledger vs. statement reconciliation.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{debug, info};

use saldo_recon::config::JoinMode;
use saldo_recon::{KeyNormalizer, ReconConfig, ReconError, ReconInput, TranslationTable};

use crate::exit_codes::{
    recon_exit_code, EXIT_RECON_DIVERGENT, EXIT_RECON_IO, EXIT_RECON_OUTPUT, EXIT_USAGE,
};
use crate::report::{format_summary, write_report_csv};
use crate::util::read_file_as_utf8;
use crate::CliError;

/// Options of `saldo run`.
pub struct RunOptions {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub mode: Option<JoinMode>,
    pub threshold: Option<Decimal>,
    pub strict: bool,
    pub quiet: bool,
}

fn recon_err(err: ReconError) -> CliError {
    let hint = match err {
        ReconError::MissingColumn { .. } => {
            Some("column names must match the file's header row exactly (after trimming)".to_string())
        }
        ReconError::ConfigParse(_) => Some("run `saldo validate <config>` to check the file".to_string()),
        _ => None,
    };
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint }
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> CliError {
    CliError { code: EXIT_RECON_IO, message: format!("cannot read {}: {e}", path.display()), hint: None }
}

fn output_err(path: &Path, e: impl std::fmt::Display) -> CliError {
    CliError { code: EXIT_RECON_OUTPUT, message: format!("cannot write {}: {e}", path.display()), hint: None }
}

// ============================================================================
// Loading
// ============================================================================

/// File paths in a config resolve against the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_file_as_utf8(config_path).map_err(|e| io_err(config_path, e))?;
    ReconConfig::from_toml(&config_str).map_err(recon_err)
}

fn load_input(config: &ReconConfig, base: &Path) -> Result<ReconInput, CliError> {
    let mut records = Vec::new();
    for (name, source) in &config.sources {
        let path = base.join(&source.file);
        let csv_data = read_file_as_utf8(&path).map_err(|e| io_err(&path, e))?;
        let rows = saldo_recon::load_csv_records(name, &csv_data, source).map_err(recon_err)?;
        debug!(source = %name, side = %source.side, rows = rows.len(), file = %path.display(), "source loaded");
        records.extend(rows);
    }
    Ok(ReconInput { records })
}

fn load_translation(config: &ReconConfig, base: &Path) -> Result<TranslationTable, CliError> {
    let csv_data = match config.translation.as_ref().and_then(|t| t.file.as_ref()) {
        Some(file) => {
            let path = base.join(file);
            Some(read_file_as_utf8(&path).map_err(|e| io_err(&path, e))?)
        }
        None => None,
    };
    let table = saldo_recon::load_translation(config, csv_data.as_deref()).map_err(recon_err)?;
    if !table.is_empty() {
        debug!(entries = table.len(), "translation table loaded");
    }
    Ok(table)
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let mut config = load_config(&opts.config)?;

    if let Some(mode) = opts.mode {
        info!(from = %config.join_mode, to = %mode, "join mode overridden");
        config.join_mode = mode;
    }
    if let Some(threshold) = opts.threshold {
        config.materiality_threshold = threshold;
        config.validate().map_err(|e| CliError {
            code: EXIT_USAGE,
            message: e.to_string(),
            hint: Some("--threshold must be zero or positive".to_string()),
        })?;
    }

    let base = base_dir(&opts.config);
    let translation = load_translation(&config, base)?;
    let input = load_input(&config, base)?;

    let result = saldo_recon::run(&config, &input, &translation).map_err(recon_err)?;

    let json_str = serde_json::to_string_pretty(&result).map_err(|e| CliError {
        code: EXIT_RECON_OUTPUT,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;

    if let Some(ref path) = opts.output {
        std::fs::write(path, &json_str).map_err(|e| output_err(path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = opts.report {
        let file = std::fs::File::create(path).map_err(|e| output_err(path, e))?;
        write_report_csv(&result.report, file).map_err(|e| output_err(path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if opts.json {
        println!("{json_str}");
    }

    if !opts.quiet {
        eprint!("{}", format_summary(&result));
    }

    let s = &result.summary;
    let flagged = s.divergent + s.accounting_only + s.statement_only;
    if opts.strict && flagged > 0 {
        return Err(CliError {
            code: EXIT_RECON_DIVERGENT,
            message: format!(
                "{} divergent row(s), {} orphan(s)",
                s.divergent,
                s.accounting_only + s.statement_only
            ),
            hint: None,
        });
    }

    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let translation = load_translation(&config, base_dir(&config_path))?;

    eprintln!(
        "valid: {} recon '{}' with {} source(s), key width {} ({}), {} translation entr{}",
        config.join_mode,
        config.name,
        config.sources.len(),
        config.key.width,
        config.key.style,
        translation.len(),
        if translation.len() == 1 { "y" } else { "ies" },
    );
    Ok(())
}

// ============================================================================
// keys
// ============================================================================

/// Print `raw<TAB>key` per identifier; unkeyable identifiers print `-`.
pub fn cmd_keys(config_path: PathBuf, raw: Vec<String>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let normalizer = KeyNormalizer::new(&config.key);

    for value in &raw {
        match normalizer.normalize(Some(value)) {
            Some(key) => println!("{value}\t{key}"),
            None => println!("{value}\t-"),
        }
    }
    Ok(())
}
