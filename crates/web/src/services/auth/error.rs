use thiserror::Error;

use crate::db::RepositoryError;

/// Why a registration, login, or profile change was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] sudsy_core::EmailError),

    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] sudsy_core::PhoneError),

    #[error("name is required")]
    MissingName,

    /// Unknown email and wrong password look the same to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Correct password, but not an active admin account.
    #[error("access denied")]
    AccessDenied,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("password rejected: {0}")]
    WeakPassword(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed")]
    PasswordHash,
}
