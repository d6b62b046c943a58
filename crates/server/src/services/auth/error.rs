//! Sign-in and account creation errors.

use thiserror::Error;

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// Unknown email or wrong password; callers must not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    UserAlreadyExists,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("name is required")]
    MissingName,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("password hashing failed")]
    PasswordHash,
}

impl AuthError {
    /// Flash code for account forms, or `None` for server-side failures.
    #[must_use]
    pub const fn form_code(&self) -> Option<&'static str> {
        match self {
            Self::UserAlreadyExists => Some("exists"),
            Self::InvalidEmail(_) => Some("email"),
            Self::WeakPassword(_) => Some("password"),
            Self::MissingName => Some("name"),
            Self::InvalidCredentials => Some("credentials"),
            Self::Repository(_) | Self::PasswordHash => None,
        }
    }
}
