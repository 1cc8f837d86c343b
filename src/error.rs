use std::{num::{ParseFloatError, ParseIntError}, sync::PoisonError};

use thiserror::Error;

/// Custom Result type for flatdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for flatdb
///
/// Every failure a command can produce is one of these. The shell prints them
/// behind a `!Failed: ` prefix and carries on with the next statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("table {0} does not exist")]
    TableNotFound(String),
    #[error("table {0} already exists")]
    TableAlreadyExists(String),
    #[error("database {0} does not exist")]
    DatabaseNotFound(String),
    #[error("database {0} already exists")]
    DatabaseAlreadyExists(String),
    #[error("no database is being used")]
    NoDatabaseSelected,
    #[error("field {0} has already been declared")]
    DuplicateField(String),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("table {0} is locked")]
    TableLocked(String),
    #[error("record conversion error: {0}")]
    RecordConversion(String),
    #[error("unknown field {0}")]
    UnknownField(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
    #[error("division by zero")]
    DivideByZero,
    #[error("cannot aggregate {0} over an empty table")]
    EmptyAggregate(String),
    #[error("no transaction is active")]
    NoActiveTransaction,
    #[error("a transaction is already active")]
    TransactionAlreadyActive,
    /// Statement syntax error
    #[error("parse error {0}")]
    Parse(String),
    #[error("config error {0}")]
    Config(String),
    #[error("io error {0}")]
    Io(String),
    #[error("internal error {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Config(value.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(value: tempfile::PersistError) -> Self {
        Error::Io(value.error.to_string())
    }
}
