//! Store error model.

use thiserror::Error;

use combotrack_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by every store operation.
///
/// Business failures are carried as [`DomainError`]; anything the database
/// itself reports is kept as the underlying `sqlx::Error`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// The domain error, if this is a business failure.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Domain(e) => e.kind(),
            StoreError::Database(_) => "database",
            StoreError::Corrupt(_) => "corrupt_row",
        }
    }
}

/// Whether the database rejected a write because of a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
