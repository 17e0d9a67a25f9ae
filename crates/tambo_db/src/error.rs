//! Error types for the record store.

use tambo_ids::{FarmId, IdParseError};
use thiserror::Error;

/// Record store operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Record store errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, decode)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Constraint violation (unique, foreign key, etc.)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] IdParseError),

    /// A form value could not be converted to its column type
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// Explicit parent farm does not exist
    #[error("Farm {0} does not exist")]
    MissingParent(FarmId),

    /// A child record was submitted without a parent and no farm exists yet
    #[error("No farm exists; create the farm before adding section data")]
    NoFarm,
}

impl DbError {
    /// Create a constraint error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for the "no parent" conditions a child write can hit.
    pub fn is_missing_parent(&self) -> bool {
        matches!(self, Self::MissingParent(_) | Self::NoFarm)
    }
}
