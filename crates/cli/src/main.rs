// saldo - ledger vs. bank statement balance reconciliation

mod exit_codes;
mod recon;
mod report;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use saldo_recon::config::JoinMode;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "saldo")]
#[command(about = "Reconcile accounting ledger balances against bank statements")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only errors on stderr; no summary
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  saldo run recon.toml
  saldo run recon.toml --json
  saldo run recon.toml --report conciliacao.csv --mode inner
  saldo run recon.toml --threshold 1.00 --strict")]
    Run {
        /// Path to the recon TOML config file
        config: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the two-header-row CSV report to file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Override the config's join mode (inner, outer, left)
        #[arg(long)]
        mode: Option<JoinMode>,

        /// Override the config's materiality threshold
        #[arg(long)]
        threshold: Option<Decimal>,

        /// Exit 1 when any row is divergent or found on one side only
        #[arg(long)]
        strict: bool,
    },

    /// Validate a recon config (and its DE-PARA table) without running
    #[command(after_help = "\
Examples:
  saldo validate recon.toml")]
    Validate {
        /// Path to the recon TOML config file
        config: PathBuf,
    },

    /// Print the canonical key of raw account identifiers under a config's key rules
    #[command(after_help = "\
Examples:
  saldo keys recon.toml 12.345-6 0000123456 '104 - 0987 - 4.567-8'")]
    Keys {
        /// Path to the recon TOML config file
        config: PathBuf,

        /// Raw account identifiers
        #[arg(required = true)]
        raw: Vec<String>,
    },
}

/// Initializes the tracing subscriber on stderr.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("saldo_recon={level},{}={level}", env!("CARGO_CRATE_NAME"))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(log_level(cli.verbose, cli.quiet));

    let result = match cli.command {
        Commands::Run { config, json, output, report, mode, threshold, strict } => {
            recon::cmd_run(recon::RunOptions {
                config,
                json,
                output,
                report,
                mode,
                threshold,
                strict,
                quiet: cli.quiet,
            })
        }
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Keys { config, raw } => recon::cmd_keys(config, raw),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
