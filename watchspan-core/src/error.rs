use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A merged interval set violated bounds or ordering, or a derived
    /// percentage left `[0, 100]`. Detection aborts the surrounding
    /// transaction instead of persisting corrupted state.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ProgressError {
    fn from(err: sqlx::Error) -> Self {
        ProgressError::Internal(format!("Database error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
