//! CLI Exit Code Registry
//!
//! Single source of truth for `vmap` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error, or `missing` found absent venues    |
//! | 2    | Usage error (bad arguments)                        |
//! | 3    | IO error (input unreadable, output unwritable)     |
//! | 4    | Parse error (malformed CSV or venue-data.js)       |
//! | 5    | Invalid pipeline config                            |
//!
//! A venue that no backend could geocode is not an error; it is reported
//! and the run still exits 0.

/// Success - command completed.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// `vmap missing` found venues absent from the current file.
/// Like `diff(1)`, exit 1 means "sets differ."
pub const EXIT_MISSING_FOUND: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 3;

/// Input was read but could not be parsed.
pub const EXIT_PARSE: u8 = 4;

/// `pipeline.toml` failed to load or validate.
pub const EXIT_CONFIG: u8 = 5;
