//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: batch scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad arguments)                               |
//! | 3    | I/O error (read, write, backup, export directory)         |
//! | 4    | Invalid input table (columns, identity codes, duplicates) |
//! | 5    | Invalid engine config                                     |
//! | 6    | Duplicates found, with `--strict-exit`                    |

use faed_dedup::DedupError;
use faed_io::IoError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

/// The input table is not a valid register export.
pub const EXIT_INVALID_INPUT: u8 = 4;

/// The `--config` file does not parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// `--strict-exit` was given and at least one signalisation is to be deleted.
pub const EXIT_DUPLICATES_FOUND: u8 = 6;

pub fn dedup_exit_code(err: &DedupError) -> u8 {
    if err.is_input_error() {
        EXIT_INVALID_INPUT
    } else {
        EXIT_INVALID_CONFIG
    }
}

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Table { source, .. } => dedup_exit_code(source),
        IoError::Read { .. }
        | IoError::Write { .. }
        | IoError::CreateDir { .. }
        | IoError::Backup { .. } => EXIT_IO,
    }
}
