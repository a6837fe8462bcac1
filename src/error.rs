//! Error types shared by the backends and the screen services.

use thiserror::Error;

/// Failures reported by a [`crate::db::Database`] implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The query matched no row. Profile resolution relies on this variant.
    #[error("no matching row")]
    NotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account for {0} already exists")]
    EmailTaken(String),

    /// A unique constraint rejected the row, such as a second membership
    /// for the same user and project.
    #[error("record already exists")]
    Conflict,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => BackendError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => BackendError::Conflict,
            other => BackendError::Database(other),
        }
    }
}

/// Failures surfaced to the user by the screen services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("project name cannot be empty")]
    EmptyName,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("unknown column `{0}`, expected todo, in-progress or done")]
    UnknownColumn(String),

    #[error("unknown role `{0}`, expected editor or viewer")]
    UnknownRole(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Backend(BackendError::NotFound))
    }
}
