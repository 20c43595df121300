//! Collection configuration: the tunable parameters of the scheduler.
//!
//! `CollectionConfig` is immutable and always valid. Build one through
//! [`ConfigBuilder`], whose fields all default to the SM-2 values below.

use crate::duration::Duration;
use crate::error::{Result, SchedulerError};
use crate::types::AlgorithmId;
use serde::{Deserialize, Serialize};

/// Longest interval a config may allow: 100 years.
pub const MAX_INTERVAL_CAP: Duration = Duration::from_days(36_500);

/// Validated, read-only scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigBuilder", into = "ConfigBuilder")]
pub struct CollectionConfig {
    algorithm: AlgorithmId,
    initial_ease_factor: f64,
    ease_factor_floor: f64,
    learning_steps: Vec<Duration>,
    graduating_interval: Duration,
    maximum_interval: Duration,
    hard_multiplier: f64,
    easy_bonus: f64,
    hard_ease_adjustment: f64,
    easy_ease_adjustment: f64,
    lapse_ease_penalty: f64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        let b = ConfigBuilder::default();
        Self {
            algorithm: b.algorithm,
            initial_ease_factor: b.initial_ease_factor,
            ease_factor_floor: b.ease_factor_floor,
            learning_steps: b.learning_steps,
            graduating_interval: b.graduating_interval,
            maximum_interval: b.maximum_interval,
            hard_multiplier: b.hard_multiplier,
            easy_bonus: b.easy_bonus,
            hard_ease_adjustment: b.hard_ease_adjustment,
            easy_ease_adjustment: b.easy_ease_adjustment,
            lapse_ease_penalty: b.lapse_ease_penalty,
        }
    }
}

impl CollectionConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.algorithm
    }

    /// Ease factor assigned when a new card enters learning.
    pub fn initial_ease_factor(&self) -> f64 {
        self.initial_ease_factor
    }

    /// Lowest ease factor any card may reach.
    pub fn ease_factor_floor(&self) -> f64 {
        self.ease_factor_floor
    }

    /// Delays between learning steps; never empty.
    pub fn learning_steps(&self) -> &[Duration] {
        &self.learning_steps
    }

    /// Base interval a card receives on graduation at the initial ease factor.
    pub fn graduating_interval(&self) -> Duration {
        self.graduating_interval
    }

    pub fn maximum_interval(&self) -> Duration {
        self.maximum_interval
    }

    /// Interval growth applied on `Hard`.
    pub fn hard_multiplier(&self) -> f64 {
        self.hard_multiplier
    }

    /// Extra growth applied on top of the ease factor on `Easy`.
    pub fn easy_bonus(&self) -> f64 {
        self.easy_bonus
    }

    pub fn hard_ease_adjustment(&self) -> f64 {
        self.hard_ease_adjustment
    }

    pub fn easy_ease_adjustment(&self) -> f64 {
        self.easy_ease_adjustment
    }

    /// Ease penalty per severity level of a failure grade.
    pub fn lapse_ease_penalty(&self) -> f64 {
        self.lapse_ease_penalty
    }

    /// Delay of the given learning step, clamped to the last step.
    pub fn learning_step(&self, index: usize) -> Duration {
        let last = self.learning_steps.len() - 1;
        self.learning_steps[index.min(last)]
    }

    /// Clamp an ease factor to the configured floor.
    pub fn clamp_ease(&self, ease: f64) -> f64 {
        ease.max(self.ease_factor_floor)
    }
}

/// Mutable, deserializable set of options that validates into a [`CollectionConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigBuilder {
    pub algorithm: AlgorithmId,
    pub initial_ease_factor: f64,
    pub ease_factor_floor: f64,
    /// Learning step delays in seconds.
    pub learning_steps: Vec<Duration>,
    pub graduating_interval: Duration,
    pub maximum_interval: Duration,
    pub hard_multiplier: f64,
    pub easy_bonus: f64,
    pub hard_ease_adjustment: f64,
    pub easy_ease_adjustment: f64,
    pub lapse_ease_penalty: f64,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmId::Sm2,
            initial_ease_factor: 2.5,
            ease_factor_floor: 1.3,
            learning_steps: vec![Duration::from_minutes(1), Duration::from_minutes(10)],
            graduating_interval: Duration::from_days(1),
            maximum_interval: Duration::from_days(36_500),
            hard_multiplier: 1.2,
            easy_bonus: 1.3,
            hard_ease_adjustment: 0.15,
            easy_ease_adjustment: 0.15,
            lapse_ease_penalty: 0.2,
        }
    }
}

impl ConfigBuilder {
    pub fn learning_steps(mut self, steps: Vec<Duration>) -> Self {
        self.learning_steps = steps;
        self
    }

    pub fn initial_ease_factor(mut self, ease: f64) -> Self {
        self.initial_ease_factor = ease;
        self
    }

    pub fn ease_factor_floor(mut self, floor: f64) -> Self {
        self.ease_factor_floor = floor;
        self
    }

    pub fn graduating_interval(mut self, interval: Duration) -> Self {
        self.graduating_interval = interval;
        self
    }

    pub fn maximum_interval(mut self, interval: Duration) -> Self {
        self.maximum_interval = interval;
        self
    }

    pub fn hard_multiplier(mut self, multiplier: f64) -> Self {
        self.hard_multiplier = multiplier;
        self
    }

    pub fn easy_bonus(mut self, bonus: f64) -> Self {
        self.easy_bonus = bonus;
        self
    }

    pub fn lapse_ease_penalty(mut self, penalty: f64) -> Self {
        self.lapse_ease_penalty = penalty;
        self
    }

    /// Validate the options and freeze them.
    pub fn build(self) -> Result<CollectionConfig> {
        self.validate()?;
        Ok(CollectionConfig {
            algorithm: self.algorithm,
            initial_ease_factor: self.initial_ease_factor,
            ease_factor_floor: self.ease_factor_floor,
            learning_steps: self.learning_steps,
            graduating_interval: self.graduating_interval,
            maximum_interval: self.maximum_interval,
            hard_multiplier: self.hard_multiplier,
            easy_bonus: self.easy_bonus,
            hard_ease_adjustment: self.hard_ease_adjustment,
            easy_ease_adjustment: self.easy_ease_adjustment,
            lapse_ease_penalty: self.lapse_ease_penalty,
        })
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SchedulerError::InvalidConfig(msg));

        if self.learning_steps.is_empty() {
            return invalid("learning_steps must not be empty".into());
        }
        if let Some(step) = self.learning_steps.iter().find(|s| s.seconds() <= 0) {
            return invalid(format!("learning step must be positive, got {}s", step.seconds()));
        }
        if !(self.ease_factor_floor > 0.0) {
            return invalid(format!(
                "ease_factor_floor must be positive, got {}",
                self.ease_factor_floor
            ));
        }
        if !(self.initial_ease_factor >= self.ease_factor_floor) {
            return invalid(format!(
                "initial_ease_factor {} is below the floor {}",
                self.initial_ease_factor, self.ease_factor_floor
            ));
        }
        if !(self.hard_multiplier > 1.0) {
            return invalid(format!("hard_multiplier must exceed 1, got {}", self.hard_multiplier));
        }
        if !(self.easy_bonus > 1.0) {
            return invalid(format!("easy_bonus must exceed 1, got {}", self.easy_bonus));
        }
        for (name, value) in [
            ("hard_ease_adjustment", self.hard_ease_adjustment),
            ("easy_ease_adjustment", self.easy_ease_adjustment),
            ("lapse_ease_penalty", self.lapse_ease_penalty),
        ] {
            if !(value >= 0.0) {
                return invalid(format!("{} must not be negative, got {}", name, value));
            }
        }
        if self.graduating_interval.seconds() <= 0 {
            return invalid("graduating_interval must be positive".into());
        }
        if self.maximum_interval < self.graduating_interval {
            return invalid("maximum_interval must not be shorter than graduating_interval".into());
        }
        if self.maximum_interval > MAX_INTERVAL_CAP {
            return invalid(format!(
                "maximum_interval must not exceed {} days, got {}",
                MAX_INTERVAL_CAP.days(),
                self.maximum_interval
            ));
        }
        if let Some(step) = self.learning_steps.iter().find(|s| **s > MAX_INTERVAL_CAP) {
            return invalid(format!("learning step {} exceeds the interval cap", step));
        }
        Ok(())
    }
}

impl TryFrom<ConfigBuilder> for CollectionConfig {
    type Error = SchedulerError;

    fn try_from(builder: ConfigBuilder) -> Result<Self> {
        builder.build()
    }
}

impl From<CollectionConfig> for ConfigBuilder {
    fn from(config: CollectionConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            initial_ease_factor: config.initial_ease_factor,
            ease_factor_floor: config.ease_factor_floor,
            learning_steps: config.learning_steps,
            graduating_interval: config.graduating_interval,
            maximum_interval: config.maximum_interval,
            hard_multiplier: config.hard_multiplier,
            easy_bonus: config.easy_bonus,
            hard_ease_adjustment: config.hard_ease_adjustment,
            easy_ease_adjustment: config.easy_ease_adjustment,
            lapse_ease_penalty: config.lapse_ease_penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(builder: ConfigBuilder) {
        assert!(matches!(builder.build(), Err(SchedulerError::InvalidConfig(_))));
    }

    #[test]
    fn default_config_matches_default_builder() {
        let built = ConfigBuilder::default().build().unwrap();
        assert_eq!(built, CollectionConfig::default());
        assert_eq!(built.initial_ease_factor(), 2.5);
        assert_eq!(built.ease_factor_floor(), 1.3);
        assert_eq!(built.easy_bonus(), 1.3);
        assert_eq!(built.learning_steps().len(), 2);
    }

    #[test]
    fn rejects_empty_learning_steps() {
        assert_invalid(CollectionConfig::builder().learning_steps(vec![]));
    }

    #[test]
    fn rejects_non_positive_learning_step() {
        assert_invalid(
            CollectionConfig::builder()
                .learning_steps(vec![Duration::from_minutes(1), Duration::ZERO]),
        );
    }

    #[test]
    fn rejects_growth_multiplier_at_or_below_one() {
        assert_invalid(CollectionConfig::builder().hard_multiplier(1.0));
        assert_invalid(CollectionConfig::builder().easy_bonus(0.9));
    }

    #[test]
    fn rejects_non_positive_floor() {
        assert_invalid(CollectionConfig::builder().ease_factor_floor(0.0));
        assert_invalid(CollectionConfig::builder().ease_factor_floor(f64::NAN));
    }

    #[test]
    fn rejects_initial_ease_below_floor() {
        assert_invalid(CollectionConfig::builder().initial_ease_factor(1.2));
    }

    #[test]
    fn rejects_negative_penalty() {
        assert_invalid(CollectionConfig::builder().lapse_ease_penalty(-0.1));
    }

    #[test]
    fn rejects_maximum_below_graduating() {
        assert_invalid(
            CollectionConfig::builder()
                .graduating_interval(Duration::from_days(3))
                .maximum_interval(Duration::from_days(2)),
        );
    }

    #[test]
    fn rejects_maximum_above_cap() {
        assert_invalid(CollectionConfig::builder().maximum_interval(Duration::from_days(100_000_000)));
        assert_invalid(
            CollectionConfig::builder().learning_steps(vec![Duration::from_days(40_000)]),
        );
        assert!(CollectionConfig::builder()
            .maximum_interval(MAX_INTERVAL_CAP)
            .build()
            .is_ok());
    }

    #[test]
    fn learning_step_clamps_to_last() {
        let config = CollectionConfig::default();
        assert_eq!(config.learning_step(0), Duration::from_minutes(1));
        assert_eq!(config.learning_step(5), Duration::from_minutes(10));
    }

    #[test]
    fn clamp_ease_respects_floor() {
        let config = CollectionConfig::default();
        assert_eq!(config.clamp_ease(0.4), 1.3);
        assert_eq!(config.clamp_ease(2.0), 2.0);
    }
}
