//! Scheduling core for spaced-repetition review.
//!
//! Provides:
//! - SM-2 card state machine (New, Learning, Due, plus host-driven Suspended/Dismissed)
//! - Six-grade answer model with side-effect-free previews of every outcome
//! - Review collection that counts and orders the cards due "now"
//! - Validated collection configuration and clock/card-source seams

pub mod algorithm;
pub mod card;
pub mod clock;
pub mod collection;
pub mod config;
pub mod duration;
pub mod error;
pub mod grading;
pub mod types;

pub use algorithm::{get_algorithm, SchedulingAlgorithm};
pub use card::{Card, CardSchedule};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{
    CardSource, CollectionStats, DueCards, InMemoryCardSource, ReviewCollection, ReviewRecord,
};
pub use config::{CollectionConfig, ConfigBuilder, MAX_INTERVAL_CAP};
pub use duration::Duration;
pub use error::{Result, SchedulerError};
pub use grading::GradingInfo;
pub use types::{AlgorithmId, CardPracticeState, Grade, StateFilter};
