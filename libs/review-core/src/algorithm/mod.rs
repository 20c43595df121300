//! Spaced repetition algorithm implementations.

pub mod sm2;

use crate::card::CardSchedule;
use crate::config::CollectionConfig;
use crate::types::{AlgorithmId, Grade};
use chrono::{DateTime, Utc};

/// A pure transition function from one card schedule to the next.
pub trait SchedulingAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn id(&self) -> AlgorithmId;

    /// Compute the schedule that results from answering `current` with `grade` at `now`.
    ///
    /// Callers must only pass active schedules (New, Learning or Due).
    fn schedule(
        &self,
        current: &CardSchedule,
        grade: Grade,
        now: DateTime<Utc>,
        config: &CollectionConfig,
    ) -> CardSchedule;
}

static SM2: sm2::Sm2 = sm2::Sm2;

/// Get algorithm by identifier.
pub fn get_algorithm(id: AlgorithmId) -> &'static dyn SchedulingAlgorithm {
    match id {
        AlgorithmId::Sm2 => &SM2,
    }
}
