//! Side-effect-free previews of answer outcomes.

use crate::card::CardSchedule;
use crate::duration::Duration;
use crate::types::{CardPracticeState, Grade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What answering a card with `grade` would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingInfo {
    pub grade: Grade,
    pub state: CardPracticeState,
    pub interval: Duration,
    pub ease_factor: f64,
    pub due_at: DateTime<Utc>,
}

impl GradingInfo {
    pub(crate) fn from_schedule(grade: Grade, schedule: &CardSchedule) -> Self {
        Self {
            grade,
            state: schedule.state,
            interval: schedule.interval,
            ease_factor: schedule.ease_factor,
            due_at: schedule.due_at,
        }
    }

    /// Short interval label for answer buttons, e.g. `10m` or `4d`.
    pub fn label(&self) -> String {
        self.interval.to_string()
    }
}
