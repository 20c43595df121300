//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid stored config: {0}")]
    Config(#[from] serde_json::Error),
}
