//! CLI support for qmacro
//!
//! Provides programmatic access to the `qmacro` commands so that other
//! tools can check, format, evaluate and decompose macros without going
//! through the binary.

mod check;
mod convert;
mod docs;

pub use check::{CheckMode, CheckOptions, CheckResult, execute_check, parse_assignment};
pub use convert::{json_to_message, value_to_json};
pub use docs::{constants_listing, functions_listing};

use std::io;

use thiserror::Error;

use crate::error::{EvalError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The message JSON has the wrong shape
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Unknown macro kind: '{0}'")]
    UnknownKind(String),
    #[error("Invalid variable '{0}', expected NAME=VALUE")]
    InvalidVariable(String),
}
