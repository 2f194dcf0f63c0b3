//! CLI command implementations
//!
//! Commands return process exit codes:
//! 0 success, 2 configuration error, 3 invalid input, 4 store connection
//! error, 5 fatal error, 130 interrupted by a signal.
//!
//! Failures are reported on stderr so stdout only carries command output.

pub mod clear;
pub mod ingest;
pub mod init;
pub mod migrate;
pub mod status;
pub mod validate;

use crate::domain::{IngestError, StoreError};
use std::fmt::Display;
use std::io::{self, Write};

/// Success
pub const EXIT_OK: i32 = 0;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// Request input is malformed
pub const EXIT_INPUT: i32 = 3;
/// Store is unreachable
pub const EXIT_CONNECTION: i32 = 4;
/// Anything else
pub const EXIT_FATAL: i32 = 5;
/// Stopped by SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for a failed operation
pub fn exit_code_for(error: &IngestError) -> i32 {
    match error {
        IngestError::Configuration(_) => EXIT_CONFIG,
        IngestError::Validation(_) | IngestError::Serialization(_) | IngestError::Io(_) => {
            EXIT_INPUT
        }
        IngestError::Store(StoreError::ConnectionFailed(_)) => EXIT_CONNECTION,
        IngestError::Store(_) => EXIT_FATAL,
        IngestError::Interrupted(_) => EXIT_INTERRUPTED,
    }
}

/// Print a failure and its cause to stderr
pub fn report_failure(what: &str, error: impl Display) {
    // Nothing sensible to do if stderr itself is gone
    let _ = write_failure(&mut io::stderr().lock(), what, error);
}

fn write_failure(out: &mut impl Write, what: &str, error: impl Display) -> io::Result<()> {
    writeln!(out, "❌ {what}")?;
    writeln!(out, "   Error: {error}")
}
