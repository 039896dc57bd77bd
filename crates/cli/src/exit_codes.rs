//! CLI Exit Code Registry
//!
//! | Code | Description                                  |
//! |------|----------------------------------------------|
//! | 0    | Success                                      |
//! | 1    | General error (unspecified)                  |
//! | 2    | Usage error (bad args, unknown template)     |
//! | 3    | I/O error (script or save directory)         |
//! | 4    | Script error (bad line, or rejected edit with `--strict`) |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown template.
pub const EXIT_USAGE: u8 = 2;

/// Reading the script or writing snapshots failed.
pub const EXIT_IO: u8 = 3;

/// A script line did not parse, or an edit was rejected under `--strict`.
pub const EXIT_SCRIPT: u8 = 4;
