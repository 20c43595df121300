//! The card state machine.

use crate::algorithm::get_algorithm;
use crate::config::CollectionConfig;
use crate::duration::Duration;
use crate::error::{Result, SchedulerError};
use crate::grading::GradingInfo;
use crate::types::{CardPracticeState, Grade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduling fields of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSchedule {
    pub state: CardPracticeState,
    pub ease_factor: f64,
    pub interval: Duration,
    /// Meaningful only while learning.
    pub learning_step: usize,
    pub lapse_count: u32,
    pub review_count: u32,
    pub due_at: DateTime<Utc>,
    /// Active state to return to when a suspended or dismissed card is restored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_state: Option<CardPracticeState>,
}

impl CardSchedule {
    /// Schedule of a card that has never been answered.
    pub fn new(created_at: DateTime<Utc>, initial_ease_factor: f64) -> Self {
        Self {
            state: CardPracticeState::New,
            ease_factor: initial_ease_factor,
            interval: Duration::ZERO,
            learning_step: 0,
            lapse_count: 0,
            review_count: 0,
            due_at: created_at,
            resume_state: None,
        }
    }
}

/// A unit of scheduling. Belongs to an opaque note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    id: i64,
    note_id: i64,
    created_at: DateTime<Utc>,
    schedule: CardSchedule,
}

impl Card {
    pub fn new(id: i64, note_id: i64, created_at: DateTime<Utc>, config: &CollectionConfig) -> Self {
        Self {
            id,
            note_id,
            created_at,
            schedule: CardSchedule::new(created_at, config.initial_ease_factor()),
        }
    }

    /// Rebuild a card from stored parts.
    pub fn from_parts(id: i64, note_id: i64, created_at: DateTime<Utc>, schedule: CardSchedule) -> Self {
        Self {
            id,
            note_id,
            created_at,
            schedule,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn note_id(&self) -> i64 {
        self.note_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn schedule(&self) -> &CardSchedule {
        &self.schedule
    }

    pub fn state(&self) -> CardPracticeState {
        self.schedule.state
    }

    pub fn ease_factor(&self) -> f64 {
        self.schedule.ease_factor
    }

    pub fn interval(&self) -> Duration {
        self.schedule.interval
    }

    pub fn learning_step(&self) -> usize {
        self.schedule.learning_step
    }

    pub fn lapse_count(&self) -> u32 {
        self.schedule.lapse_count
    }

    pub fn review_count(&self) -> u32 {
        self.schedule.review_count
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.schedule.due_at
    }

    pub fn is_new(&self) -> bool {
        self.state() == CardPracticeState::New
    }

    pub fn is_learning(&self) -> bool {
        self.state() == CardPracticeState::Learning
    }

    pub fn is_due(&self) -> bool {
        self.state() == CardPracticeState::Due
    }

    pub fn is_dismissed(&self) -> bool {
        self.state() == CardPracticeState::Dismissed
    }

    pub fn is_suspended(&self) -> bool {
        self.state() == CardPracticeState::Suspended
    }

    /// Whether the card belongs in the review queue at `now`.
    ///
    /// New cards are always eligible; learning and due cards once `due_at` has passed.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        match self.state() {
            CardPracticeState::New => true,
            CardPracticeState::Learning | CardPracticeState::Due => self.due_at() <= now,
            CardPracticeState::Dismissed | CardPracticeState::Suspended => false,
        }
    }

    /// Record an answer. The only scheduling transition of a card.
    pub fn answer(&mut self, grade: Grade, config: &CollectionConfig, now: DateTime<Utc>) -> Result<()> {
        self.ensure_active()?;
        let before = self.state();
        self.schedule = get_algorithm(config.algorithm()).schedule(&self.schedule, grade, now, config);
        tracing::debug!(
            card_id = self.id,
            grade = grade.as_str(),
            from = before.as_str(),
            to = self.state().as_str(),
            interval = %self.interval(),
            ease = self.ease_factor(),
            "card answered"
        );
        Ok(())
    }

    /// Preview the outcome of every grade, in ascending grade order, without mutating the card.
    pub fn compute_grades(&self, config: &CollectionConfig, now: DateTime<Utc>) -> Result<[GradingInfo; 6]> {
        self.ensure_active()?;
        let algorithm = get_algorithm(config.algorithm());
        Ok(Grade::ALL.map(|grade| {
            let outcome = algorithm.schedule(&self.schedule, grade, now, config);
            GradingInfo::from_schedule(grade, &outcome)
        }))
    }

    /// Pause the card. No-op if it is already inactive.
    pub fn suspend(&mut self) {
        self.deactivate(CardPracticeState::Suspended);
    }

    /// Remove the card from rotation. A suspended card becomes dismissed.
    pub fn dismiss(&mut self) {
        self.deactivate(CardPracticeState::Dismissed);
    }

    /// Return a suspended or dismissed card to the state it left.
    pub fn restore(&mut self) {
        if self.state().is_active() {
            return;
        }
        let resumed = self.schedule.resume_state.take().unwrap_or(if self.review_count() == 0 {
            CardPracticeState::New
        } else {
            CardPracticeState::Due
        });
        tracing::info!(card_id = self.id, from = self.state().as_str(), to = resumed.as_str(), "card restored");
        self.schedule.state = resumed;
    }

    fn deactivate(&mut self, target: CardPracticeState) {
        let current = self.state();
        if current == target || (current == CardPracticeState::Dismissed && target == CardPracticeState::Suspended) {
            return;
        }
        if current.is_active() {
            self.schedule.resume_state = Some(current);
        }
        tracing::info!(card_id = self.id, from = current.as_str(), to = target.as_str(), "card deactivated");
        self.schedule.state = target;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state().is_active() {
            Ok(())
        } else {
            tracing::warn!(card_id = self.id, state = self.state().as_str(), "rejected answer on inactive card");
            Err(SchedulerError::InactiveCard {
                id: self.id,
                state: self.state(),
            })
        }
    }
}
