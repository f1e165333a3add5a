//! Error types for the paper-trading platform
//!
//! This module provides a unified error handling system for every crate in
//! the workspace. The ledger rejections (`InvalidOrder`, `InsufficientFunds`,
//! `InsufficientHoldings`) and the collaborator failures (`QuoteUnavailable`,
//! `PersistenceConflict`) are all recoverable by the caller; none of them is
//! fatal to the process.

use std::fmt::Display;
use thiserror::Error;

/// Platform error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed order (bad quantity or symbol shape)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A buy would cost more than the available cash balance
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// A sell exceeds the shares held
    #[error("Insufficient holdings: {0}")]
    InsufficientHoldings(String),

    /// The quote provider could not supply a usable price
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// The atomic read-modify-write could not acquire its locks in time
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidOrder(_) => "InvalidOrder",
            Error::InsufficientFunds(_) => "InsufficientFunds",
            Error::InsufficientHoldings(_) => "InsufficientHoldings",
            Error::QuoteUnavailable(_) => "QuoteUnavailable",
            Error::PersistenceConflict(_) => "PersistenceConflict",
            Error::AccountNotFound(_) => "AccountNotFound",
            Error::ValidationError(_) => "ValidationError",
            Error::ConfigurationError(_) => "ConfigurationError",
            Error::AuthorizationError(_) => "AuthorizationError",
            Error::Internal(_) => "Internal",
            Error::Database(_) => "Database",
            Error::Migration(_) => "Migration",
            Error::Serialization(_) => "Serialization",
            Error::DecimalError(_) => "DecimalError",
        }
    }

    /// Whether the same request may succeed if retried later unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::QuoteUnavailable(_) | Error::PersistenceConflict(_))
    }

    /// Whether this is one of the ledger's order rejections
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidOrder(_) | Error::InsufficientFunds(_) | Error::InsufficientHoldings(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::InvalidOrder(msg) => Error::InvalidOrder(format!("{}: {}", context, msg)),
                Error::InsufficientFunds(msg) => Error::InsufficientFunds(format!("{}: {}", context, msg)),
                Error::InsufficientHoldings(msg) => Error::InsufficientHoldings(format!("{}: {}", context, msg)),
                Error::QuoteUnavailable(msg) => Error::QuoteUnavailable(format!("{}: {}", context, msg)),
                Error::PersistenceConflict(msg) => Error::PersistenceConflict(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::AuthorizationError(msg) => Error::AuthorizationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
