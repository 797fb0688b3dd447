//! CLI Exit Code Registry
//!
//! Single source of truth for `labelrecon` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unknown format)          |
//! | 3    | Configuration error (thresholds, column types, TOML) |
//! | 4    | Empty input for the selected workflow                |
//! | 5    | Input is not a table of records, or lacks a column   |
//! | 6    | File read/write or archive failure                   |

use labelrecon::ReconError;

/// Success - run completed and every requested output was written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown input format.
pub const EXIT_USAGE: u8 = 2;

/// Invalid configuration. Reported before any input is read.
pub const EXIT_CONFIG: u8 = 3;

/// No usable rows for the selected workflow.
pub const EXIT_EMPTY_INPUT: u8 = 4;

/// Input could not be read as records, or the group-by column is missing.
pub const EXIT_INPUT_FORMAT: u8 = 5;

/// IO failure while reading input or writing outputs.
pub const EXIT_IO: u8 = 6;

/// Exit code for an engine error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::UnknownFieldType { .. } => EXIT_CONFIG,
        ReconError::EmptyInput { .. } => EXIT_EMPTY_INPUT,
        ReconError::InputFormat(_) | ReconError::MissingColumn { .. } => EXIT_INPUT_FORMAT,
        ReconError::Io(_) => EXIT_IO,
        // Cell errors are absorbed by the loaders; seeing one here is a bug.
        ReconError::FieldParse { .. } => EXIT_ERROR,
    }
}
