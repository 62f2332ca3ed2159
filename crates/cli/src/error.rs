//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: simulation error (unknown preset, invalid config, physics failure)
//! - 11: I/O error (OBJ export, logger setup)
//! - 12: input error (bad JSON params, bad pointer coordinates)
//! - 13: serialization error

use ferrofluid_core::FerroError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    Simulation(FerroError),
    Io(String),
    Input(String),
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Simulation(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Simulation(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<FerroError> for CliError {
    fn from(e: FerroError) -> Self {
        match e {
            FerroError::Io(msg) => CliError::Io(msg),
            other => CliError::Simulation(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
