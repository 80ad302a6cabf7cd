//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | Divergent rows found (`run --strict`)    |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 3-9     | recon            | Config, input and output failures        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the relevant command

use saldo_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, e.g. an override the config rejects.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (1, 3-9)
// =============================================================================

/// `run --strict` found divergent or orphaned rows.
/// Like `diff(1)`, exit 1 means "sources differ."
pub const EXIT_RECON_DIVERGENT: u8 = 1;

/// Config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// A config, source or translation file could not be read.
pub const EXIT_RECON_IO: u8 = 4;

/// A source file is malformed or lacks a mapped column.
pub const EXIT_RECON_INPUT: u8 = 5;

/// The DE-PARA table has unkeyable or conflicting entries.
pub const EXIT_RECON_TRANSLATION: u8 = 6;

/// A JSON or CSV output could not be written.
pub const EXIT_RECON_OUTPUT: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::Csv { .. } => EXIT_RECON_INPUT,
        ReconError::Translation(_) => EXIT_RECON_TRANSLATION,
        ReconError::Io(_) => EXIT_RECON_IO,
    }
}
