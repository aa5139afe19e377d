//! Error taxonomy shared by the repositories, the policy, and the service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or content; user-correctable.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (username already taken).
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials, missing session, or a policy denial.
    #[error("{0}")]
    Auth(String),

    /// Underlying persistence failure.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl Error {
    /// User-visible flash message. Store failures get a generic message so
    /// SQL and connection details never reach the browser.
    #[must_use]
    pub fn flash_message(&self) -> String {
        match self {
            Self::Store(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation)
        }
        _ => false,
    }
}
