//! The module contains the error the engine can throw.
//!
//! The errors are grouped the way callers react to them:
//!
//! - [`KeyNotFound`] when a record does not exist or is outside the caller's
//!   scope.
//! - [`Forbidden`] when the record is visible but the caller's role does not
//!   allow the operation.
//! - [`ExistingKey`] for conflicts (duplicates, overlapping budgets, invites
//!   already accepted).
//! - [`Expired`] for invites past their expiry.
//! - the `Invalid*` variants for input that fails validation.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Expired`]: EngineError::Expired
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Expired: {0}")]
    Expired(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for the variants raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InvalidPeriod(_)
                | Self::InvalidRole(_)
                | Self::InvalidName(_)
                | Self::InvalidValue(_)
                | Self::InvalidReference(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Expired(a), Self::Expired(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidValue(a), Self::InvalidValue(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
