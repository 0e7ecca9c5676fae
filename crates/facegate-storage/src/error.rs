use thiserror::Error;

/// Storage-specific error types for the facegate credential store.
///
/// These errors represent failures in database operations and integrity
/// checks on the rows read back from the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An identity is already enrolled and the write would duplicate it
    #[error("Identity already enrolled: {identity}")]
    Duplicate { identity: String },

    /// A stored row could not be turned back into a domain value
    #[error("Corrupt record for {identity}: {reason}")]
    Corrupt { identity: String, reason: String },

    /// Data validation failed before writing
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub fn duplicate(identity: impl Into<String>) -> Self {
        Self::Duplicate {
            identity: identity.into(),
        }
    }

    pub fn corrupt(identity: impl Into<String>, reason: impl ToString) -> Self {
        Self::Corrupt {
            identity: identity.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a uniqueness violation reported by SQLite.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Duplicate { .. } => true,
            Self::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
