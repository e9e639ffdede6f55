use std::num::ParseIntError;
use std::str::ParseBoolError;
use thiserror::Error;

/// Errors surfaced by the crate.
#[derive(Error, Debug)]
pub enum TsError {
    /// The byte source failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A structure could not be parsed.
    #[error("parser error: {0}")]
    Parser(String),

    /// A field held a value outside its range.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A configuration key or value was not understood.
    #[error("config error: {0}")]
    Config(String),

    /// A numeric configuration value did not parse.
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),

    /// A boolean configuration value did not parse.
    #[error("parse bool error: {0}")]
    ParseBool(#[from] ParseBoolError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TsError>;
