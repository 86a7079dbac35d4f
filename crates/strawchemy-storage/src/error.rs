//! Storage error types.

use std::fmt;

/// Errors raised by a [`crate::Session`] or [`crate::Database`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    /// The requested row was not found.
    #[error("Row not found: {table}/{id}")]
    NotFound { table: String, id: i64 },

    /// A write would break a foreign key, a delete rule or a unique key.
    #[error("Integrity error: {message}")]
    Integrity { message: String },

    /// A value does not fit its column.
    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Session is closed")]
    Closed,

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StorageError {
    #[must_use]
    pub fn not_found(table: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            table: table.into(),
            id,
        }
    }

    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Integrity { .. } => ErrorCategory::Integrity,
            Self::InvalidValue { .. } | Self::UnknownColumn { .. } => ErrorCategory::Validation,
            Self::Closed | Self::Transaction { .. } => ErrorCategory::Transaction,
            Self::UnknownTable(_) | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Integrity,
    Validation,
    Transaction,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Integrity => write!(f, "integrity"),
            Self::Validation => write!(f, "validation"),
            Self::Transaction => write!(f, "transaction"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
