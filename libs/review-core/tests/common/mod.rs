//! Shared fixtures for review-core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use review_core::{
    Card, CardPracticeState, CardSchedule, CollectionConfig, Duration, InMemoryCardSource,
    ManualClock, ReviewCollection,
};
use std::sync::Arc;

pub type TestCollection = ReviewCollection<InMemoryCardSource<Arc<ManualClock>>>;

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::default())
}

pub fn collection(cards: Vec<Card>, clock: Arc<ManualClock>) -> TestCollection {
    ReviewCollection::new(
        InMemoryCardSource::with_cards(cards, clock),
        CollectionConfig::default(),
    )
}

pub fn new_card(id: i64, created_at: DateTime<Utc>) -> Card {
    Card::new(id, id, created_at, &CollectionConfig::default())
}

/// A card that has been reviewed before, sitting in `state` with the given due time.
pub fn reviewed_card(id: i64, state: CardPracticeState, due_at: DateTime<Utc>) -> Card {
    let schedule = CardSchedule {
        state,
        interval: Duration::from_days(3),
        review_count: 4,
        due_at,
        ..CardSchedule::new(due_at - chrono::Duration::days(30), 2.5)
    };
    Card::from_parts(id, id, due_at - chrono::Duration::days(30), schedule)
}
