//! Database-specific error types and conversions.

use hram_core::error::HramError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for HramError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => HramError::NotFound { entity, id },
            other => HramError::Storage(other.to_string()),
        }
    }
}
