//! Error types for review-core.

use crate::types::CardPracticeState;
use thiserror::Error;

/// Result type alias using SchedulerError.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors surfaced by the scheduling core.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid grade value: {0}")]
    InvalidGrade(u8),

    #[error("card {id} is {state} and cannot be answered")]
    InactiveCard { id: i64, state: CardPracticeState },

    #[error("invalid collection config: {0}")]
    InvalidConfig(String),

    #[error("card not found: {0}")]
    CardNotFound(i64),

    #[error("card source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SchedulerError {
    /// Wrap an error raised by a card source.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }
}
