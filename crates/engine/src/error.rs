//! The module contains the errors the engine can throw.
//!
//! Errors fall in three families:
//!
//! - [`ParseError`] for a command line that cannot become a mutation. Always
//!   raised before the ledger is touched.
//! - [`Selection`] when a command needs an account that was never selected.
//! - [`Database`] and [`CorruptedRecord`] when the storage layer fails.
//!
//!  [`Selection`]: EngineError::Selection
//!  [`Database`]: EngineError::Database
//!  [`CorruptedRecord`]: EngineError::CorruptedRecord
use sea_orm::DbErr;
use thiserror::Error;

/// Why a command line was rejected.
///
/// Every variant that refers to user input carries the literal token as typed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("unknown unit in \"{0}\"")]
    UnknownUnit(String),
    #[error("unknown account alias: {0}")]
    UnknownAccount(String),
    #[error("no quantities given")]
    NoQuantities,
}

impl ParseError {
    /// The offending literal token, when the error points at one.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::InvalidToken(token) | Self::UnknownUnit(token) | Self::UnknownAccount(token) => {
                Some(token)
            }
            Self::Empty | Self::NoQuantities => None,
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("No account selected: {0}")]
    Selection(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Corrupted record: {0}")]
    CorruptedRecord(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse grouping of [`EngineError`] used by callers to pick feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Selection,
    Lookup,
    Storage,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse(_) => ErrorCategory::Parse,
            Self::Selection(_) => ErrorCategory::Selection,
            Self::KeyNotFound(_) | Self::InvalidName(_) | Self::InvalidValue(_) => {
                ErrorCategory::Lookup
            }
            Self::CorruptedRecord(_) | Self::Database(_) => ErrorCategory::Storage,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Parse(a), Self::Parse(b)) => a == b,
            (Self::Selection(a), Self::Selection(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidValue(a), Self::InvalidValue(b)) => a == b,
            (Self::CorruptedRecord(a), Self::CorruptedRecord(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
