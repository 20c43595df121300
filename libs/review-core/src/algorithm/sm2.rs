//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with learning steps and a three-tier failure scale.
//! All tunables come from [`CollectionConfig`].

use super::SchedulingAlgorithm;
use crate::card::CardSchedule;
use crate::config::CollectionConfig;
use crate::duration::Duration;
use crate::types::{AlgorithmId, CardPracticeState, Grade};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sm2;

impl SchedulingAlgorithm for Sm2 {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::Sm2
    }

    fn schedule(
        &self,
        current: &CardSchedule,
        grade: Grade,
        now: DateTime<Utc>,
        config: &CollectionConfig,
    ) -> CardSchedule {
        let mut next = current.clone();

        if next.state == CardPracticeState::New {
            next.state = CardPracticeState::Learning;
            next.learning_step = 0;
            next.ease_factor = config.initial_ease_factor();
        }

        match (next.state, grade.is_success()) {
            (CardPracticeState::Learning, true) => self.advance_learning(&mut next, grade, config),
            (CardPracticeState::Learning, false) => self.relearn(&mut next, grade, config, true),
            (CardPracticeState::Due, true) => self.grow_interval(&mut next, grade, config),
            (CardPracticeState::Due, false) => self.relearn(&mut next, grade, config, false),
            // Inactive cards are rejected before reaching the algorithm.
            _ => return next,
        }

        next.review_count += 1;
        next.due_at = now
            .checked_add_signed(next.interval.to_chrono())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        next
    }
}

impl Sm2 {
    fn advance_learning(&self, next: &mut CardSchedule, grade: Grade, config: &CollectionConfig) {
        next.ease_factor = config.clamp_ease(next.ease_factor);
        let step = next.learning_step + 1;
        if step < config.learning_steps().len() {
            next.learning_step = step;
            next.interval = config.learning_step(step);
            return;
        }

        // Graduation: base interval scaled by how the ease compares to a fresh card.
        let mut interval = config
            .graduating_interval()
            .scale(next.ease_factor / config.initial_ease_factor());
        if grade == Grade::Easy {
            interval = interval.scale(config.easy_bonus());
        }
        next.state = CardPracticeState::Due;
        next.learning_step = 0;
        next.interval = clamp_interval(interval, Duration::from_seconds(1), config);
    }

    fn grow_interval(&self, next: &mut CardSchedule, grade: Grade, config: &CollectionConfig) {
        let ease = next.ease_factor;
        let (factor, ease_adj) = match grade {
            Grade::Hard => (config.hard_multiplier(), -config.hard_ease_adjustment()),
            Grade::Easy => (ease * config.easy_bonus(), config.easy_ease_adjustment()),
            _ => (ease, 0.0),
        };
        next.interval = clamp_interval(
            next.interval.scale(factor),
            config.graduating_interval(),
            config,
        );
        next.ease_factor = config.clamp_ease(ease + ease_adj);
    }

    /// Send the card back to the first learning step after a failure.
    ///
    /// While learning, plain `Fail` carries no ease penalty; each further
    /// severity level costs one `lapse_ease_penalty`. A lapse from review is
    /// penalized for every severity level.
    fn relearn(
        &self,
        next: &mut CardSchedule,
        grade: Grade,
        config: &CollectionConfig,
        in_learning: bool,
    ) {
        let levels = if in_learning {
            grade.severity().saturating_sub(1)
        } else {
            grade.severity()
        };
        let penalty = config.lapse_ease_penalty() * f64::from(levels);

        next.state = CardPracticeState::Learning;
        next.learning_step = 0;
        next.interval = config.learning_step(0);
        next.ease_factor = config.clamp_ease(next.ease_factor - penalty);
        next.lapse_count += 1;
    }
}

fn clamp_interval(interval: Duration, min: Duration, config: &CollectionConfig) -> Duration {
    interval.max(min).min(config.maximum_interval())
}
