//! Review collection: a derived, always-current view of which cards are due.
//!
//! The collection never caches eligibility. Every query loads cards from the
//! [`CardSource`] and re-evaluates them against the source's clock.

use crate::card::Card;
use crate::clock::{Clock, SystemClock};
use crate::config::CollectionConfig;
use crate::duration::Duration;
use crate::error::{Result, SchedulerError};
use crate::grading::GradingInfo;
use crate::types::{AlgorithmId, CardPracticeState, Grade, StateFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage collaborator the collection reads cards from and writes them back to.
pub trait CardSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_cards(&self) -> std::result::Result<Vec<Card>, Self::Error>;

    fn load_card(&self, id: i64) -> std::result::Result<Option<Card>, Self::Error> {
        Ok(self.load_cards()?.into_iter().find(|c| c.id() == id))
    }

    /// Persist a card after mutation.
    fn save_card(&self, card: &Card) -> std::result::Result<(), Self::Error>;

    /// Persist the history entry of an answer. Sources without a log ignore it.
    fn record_review(&self, _record: &ReviewRecord) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    /// Persist an answered card together with its history entry.
    ///
    /// The default writes the entry first, so a failed log write leaves the
    /// card untouched. Sources with transactions override this to write both
    /// atomically.
    fn save_answer(&self, card: &Card, record: &ReviewRecord) -> std::result::Result<(), Self::Error> {
        self.record_review(record)?;
        self.save_card(card)
    }

    /// Current instant used for all eligibility and scheduling decisions.
    fn now(&self) -> DateTime<Utc>;
}

/// History entry for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub card_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub grade: Grade,
    pub state_before: CardPracticeState,
    pub state_after: CardPracticeState,
    pub interval_before: Duration,
    pub interval_after: Duration,
    pub ease_before: f64,
    pub ease_after: f64,
    pub algorithm: AlgorithmId,
}

/// Per-state totals for a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub due_cards: usize,
    pub suspended_cards: usize,
    pub dismissed_cards: usize,
    /// Cards eligible for review right now.
    pub due_now: usize,
    /// Mean ease factor of cards that have left the new state.
    pub average_ease: f64,
}

/// Sorted snapshot of the cards due when it was taken, in review order.
#[derive(Debug)]
pub struct DueCards {
    inner: std::vec::IntoIter<Card>,
}

impl Iterator for DueCards {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DueCards {}

/// Queryable view over a card source.
pub struct ReviewCollection<S> {
    source: S,
    config: CollectionConfig,
}

impl<S: CardSource> ReviewCollection<S> {
    pub fn new(source: S, config: CollectionConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of cards eligible for review now.
    pub fn count(&self) -> Result<usize> {
        let now = self.source.now();
        Ok(self.load()?.iter().filter(|c| c.is_eligible(now)).count())
    }

    /// Number of cards in any flagged state.
    ///
    /// Active states count only when eligible now. Suspended and dismissed
    /// cards count whenever their flag is set, regardless of `due_at`.
    pub fn count_by_state(&self, filter: StateFilter) -> Result<usize> {
        let now = self.source.now();
        Ok(self
            .load()?
            .iter()
            .filter(|c| filter.matches(c.state()))
            .filter(|c| !c.state().is_active() || c.is_eligible(now))
            .count())
    }

    /// Eligible cards: new cards first by creation, then oldest-overdue first.
    ///
    /// Ordering needs the whole eligible set, so each call loads and sorts a
    /// full snapshot up front; the iterator does not stream from the source.
    /// Call again to restart with fresh data. Cards answered meanwhile are
    /// not re-checked.
    pub fn due_cards(&self) -> Result<DueCards> {
        let now = self.source.now();
        let mut cards: Vec<Card> = self.load()?.into_iter().filter(|c| c.is_eligible(now)).collect();
        cards.sort_by(review_order);
        Ok(DueCards {
            inner: cards.into_iter(),
        })
    }

    /// The next `limit` cards to review.
    pub fn next_due(&self, limit: usize) -> Result<Vec<Card>> {
        Ok(self.due_cards()?.take(limit).collect())
    }

    /// Preview all six outcomes for a card against a single "now".
    pub fn preview(&self, card_id: i64) -> Result<[GradingInfo; 6]> {
        let card = self.card(card_id)?;
        card.compute_grades(&self.config, self.source.now())
    }

    /// Answer a card, then persist it and its review record through
    /// [`CardSource::save_answer`].
    pub fn answer(&self, card_id: i64, grade: Grade) -> Result<Card> {
        let mut card = self.card(card_id)?;
        let now = self.source.now();
        let before = card.clone();
        card.answer(grade, &self.config, now)?;

        let record = ReviewRecord {
            card_id,
            reviewed_at: now,
            grade,
            state_before: before.state(),
            state_after: card.state(),
            interval_before: before.interval(),
            interval_after: card.interval(),
            ease_before: before.ease_factor(),
            ease_after: card.ease_factor(),
            algorithm: self.config.algorithm(),
        };
        self.source
            .save_answer(&card, &record)
            .map_err(SchedulerError::from_source)?;
        Ok(card)
    }

    pub fn suspend(&self, card_id: i64) -> Result<Card> {
        self.update(card_id, Card::suspend)
    }

    pub fn dismiss(&self, card_id: i64) -> Result<Card> {
        self.update(card_id, Card::dismiss)
    }

    pub fn restore(&self, card_id: i64) -> Result<Card> {
        self.update(card_id, Card::restore)
    }

    pub fn stats(&self) -> Result<CollectionStats> {
        let now = self.source.now();
        let cards = self.load()?;
        let mut stats = CollectionStats {
            total_cards: cards.len(),
            ..Default::default()
        };
        let mut ease_sum = 0.0;
        let mut ease_count = 0usize;

        for card in &cards {
            match card.state() {
                CardPracticeState::New => stats.new_cards += 1,
                CardPracticeState::Learning => stats.learning_cards += 1,
                CardPracticeState::Due => stats.due_cards += 1,
                CardPracticeState::Suspended => stats.suspended_cards += 1,
                CardPracticeState::Dismissed => stats.dismissed_cards += 1,
            }
            if card.is_eligible(now) {
                stats.due_now += 1;
            }
            if card.review_count() > 0 {
                ease_sum += card.ease_factor();
                ease_count += 1;
            }
        }
        if ease_count > 0 {
            stats.average_ease = ease_sum / ease_count as f64;
        }
        Ok(stats)
    }

    fn update(&self, card_id: i64, change: impl FnOnce(&mut Card)) -> Result<Card> {
        let mut card = self.card(card_id)?;
        change(&mut card);
        self.source.save_card(&card).map_err(SchedulerError::from_source)?;
        Ok(card)
    }

    fn card(&self, card_id: i64) -> Result<Card> {
        self.source
            .load_card(card_id)
            .map_err(SchedulerError::from_source)?
            .ok_or(SchedulerError::CardNotFound(card_id))
    }

    fn load(&self) -> Result<Vec<Card>> {
        self.source.load_cards().map_err(SchedulerError::from_source)
    }
}

fn review_order(a: &Card, b: &Card) -> Ordering {
    // New cards first; then by due time. Creation order and id break ties.
    b.is_new()
        .cmp(&a.is_new())
        .then_with(|| {
            if a.is_new() && b.is_new() {
                Ordering::Equal
            } else {
                a.due_at().cmp(&b.due_at())
            }
        })
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

/// Card source held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCardSource<C = SystemClock> {
    cards: RwLock<BTreeMap<i64, Card>>,
    reviews: RwLock<Vec<ReviewRecord>>,
    clock: C,
}

impl<C: Clock> InMemoryCardSource<C> {
    pub fn new(clock: C) -> Self {
        Self {
            cards: RwLock::new(BTreeMap::new()),
            reviews: RwLock::new(Vec::new()),
            clock,
        }
    }

    pub fn with_cards(cards: impl IntoIterator<Item = Card>, clock: C) -> Self {
        let source = Self::new(clock);
        for card in cards {
            source.insert(card);
        }
        source
    }

    /// Insert or replace a card.
    pub fn insert(&self, card: Card) {
        write(&self.cards).insert(card.id(), card);
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Recorded review history, oldest first.
    pub fn reviews(&self) -> Vec<ReviewRecord> {
        read(&self.reviews).clone()
    }
}

impl<C: Clock> CardSource for InMemoryCardSource<C> {
    type Error = Infallible;

    fn load_cards(&self) -> std::result::Result<Vec<Card>, Infallible> {
        Ok(read(&self.cards).values().cloned().collect())
    }

    fn load_card(&self, id: i64) -> std::result::Result<Option<Card>, Infallible> {
        Ok(read(&self.cards).get(&id).cloned())
    }

    fn save_card(&self, card: &Card) -> std::result::Result<(), Infallible> {
        self.insert(card.clone());
        Ok(())
    }

    fn record_review(&self, record: &ReviewRecord) -> std::result::Result<(), Infallible> {
        write(&self.reviews).push(record.clone());
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

// Poisoning only means a writer panicked; the map itself is still consistent.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn collection(cards: Vec<Card>, clock: Arc<ManualClock>) -> ReviewCollection<InMemoryCardSource<Arc<ManualClock>>> {
        ReviewCollection::new(
            InMemoryCardSource::with_cards(cards, clock),
            CollectionConfig::default(),
        )
    }

    fn card_in(id: i64, state: CardPracticeState, due_at: DateTime<Utc>, created_at: DateTime<Utc>) -> Card {
        let mut schedule = crate::card::CardSchedule::new(created_at, 2.5);
        schedule.state = state;
        schedule.due_at = due_at;
        if state != CardPracticeState::New {
            schedule.review_count = 1;
            schedule.interval = Duration::from_days(1);
        }
        Card::from_parts(id, id, created_at, schedule)
    }

    #[test]
    fn unknown_card_is_reported() {
        let clock = Arc::new(ManualClock::default());
        let collection = collection(vec![], clock);
        assert!(matches!(collection.answer(42, Grade::Good), Err(SchedulerError::CardNotFound(42))));
        assert!(matches!(collection.preview(42), Err(SchedulerError::CardNotFound(42))));
    }

    #[test]
    fn answer_persists_and_records_review() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let collection = collection(vec![card_in(1, CardPracticeState::New, now, now)], clock);

        let card = collection.answer(1, Grade::Good).unwrap();
        assert!(card.is_learning());
        assert_eq!(collection.source().load_card(1).unwrap(), Some(card.clone()));

        let reviews = collection.source().reviews();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].state_before, CardPracticeState::New);
        assert_eq!(reviews[0].state_after, CardPracticeState::Learning);
        assert_eq!(reviews[0].interval_after, Duration::from_minutes(10));
        assert_eq!(reviews[0].algorithm, AlgorithmId::Sm2);
    }

    /// Delegates to an in-memory source but refuses to write review history.
    struct BrokenLog(InMemoryCardSource<Arc<ManualClock>>);

    impl CardSource for BrokenLog {
        type Error = std::io::Error;

        fn load_cards(&self) -> std::result::Result<Vec<Card>, std::io::Error> {
            Ok(self.0.load_cards().unwrap_or_default())
        }

        fn save_card(&self, card: &Card) -> std::result::Result<(), std::io::Error> {
            self.0.insert(card.clone());
            Ok(())
        }

        fn record_review(&self, _record: &ReviewRecord) -> std::result::Result<(), std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "log unavailable"))
        }

        fn now(&self) -> DateTime<Utc> {
            self.0.now()
        }
    }

    #[test]
    fn failed_log_write_leaves_card_unchanged() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let collection = ReviewCollection::new(
            BrokenLog(InMemoryCardSource::with_cards(
                vec![card_in(1, CardPracticeState::New, now, now)],
                clock,
            )),
            CollectionConfig::default(),
        );

        assert!(matches!(collection.answer(1, Grade::Good), Err(SchedulerError::Source(_))));
        let stored = collection.source().load_card(1).unwrap().unwrap();
        assert!(stored.is_new());
        assert_eq!(stored.review_count(), 0);
        assert_eq!(collection.count().unwrap(), 1);
    }

    #[test]
    fn answered_card_leaves_queue_until_due_again() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let collection = collection(vec![card_in(1, CardPracticeState::New, now, now)], clock.clone());

        assert_eq!(collection.count().unwrap(), 1);
        collection.answer(1, Grade::Good).unwrap();
        assert_eq!(collection.count().unwrap(), 0);

        clock.advance(Duration::from_minutes(10));
        assert_eq!(collection.count().unwrap(), 1);
    }

    #[test]
    fn suspend_and_restore_through_collection() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let collection = collection(vec![card_in(1, CardPracticeState::New, now, now)], clock);

        collection.suspend(1).unwrap();
        assert_eq!(collection.count().unwrap(), 0);
        assert!(matches!(
            collection.answer(1, Grade::Good),
            Err(SchedulerError::InactiveCard { id: 1, .. })
        ));
        assert_eq!(collection.count_by_state(StateFilter::SUSPENDED).unwrap(), 1);

        collection.dismiss(1).unwrap();
        assert_eq!(collection.count_by_state(StateFilter::DISMISSED).unwrap(), 1);

        let restored = collection.restore(1).unwrap();
        assert!(restored.is_new());
        assert_eq!(collection.count().unwrap(), 1);
    }

    #[test]
    fn count_by_state_combines_flags() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let later = now + chrono::Duration::hours(1);
        let collection = collection(
            vec![
                card_in(1, CardPracticeState::New, now, now),
                card_in(2, CardPracticeState::Learning, now, now),
                card_in(3, CardPracticeState::Due, now, now),
                card_in(4, CardPracticeState::Due, later, now),
                card_in(5, CardPracticeState::Dismissed, now, now),
            ],
            clock,
        );

        assert_eq!(collection.count_by_state(StateFilter::NEW | StateFilter::DUE).unwrap(), 2);
        assert_eq!(collection.count_by_state(StateFilter::ACTIVE).unwrap(), 3);
        assert_eq!(collection.count_by_state(StateFilter::all()).unwrap(), 4);
        assert_eq!(collection.count_by_state(StateFilter::empty()).unwrap(), 0);
    }

    #[test]
    fn ties_break_by_creation_then_id() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let earlier = now - chrono::Duration::days(1);
        let collection = collection(
            vec![
                card_in(3, CardPracticeState::New, now, now),
                card_in(2, CardPracticeState::New, now, now),
                card_in(1, CardPracticeState::New, now, now + chrono::Duration::seconds(1)),
                card_in(4, CardPracticeState::Due, earlier, now),
                card_in(5, CardPracticeState::Due, earlier, earlier),
            ],
            clock,
        );

        let order: Vec<i64> = collection.due_cards().unwrap().map(|c| c.id()).collect();
        assert_eq!(order, vec![2, 3, 1, 5, 4]);
        assert_eq!(collection.next_due(2).unwrap().len(), 2);
    }

    #[test]
    fn stats_summarize_states() {
        let clock = Arc::new(ManualClock::default());
        let now = clock.now();
        let later = now + chrono::Duration::days(3);
        let collection = collection(
            vec![
                card_in(1, CardPracticeState::New, now, now),
                card_in(2, CardPracticeState::Learning, now, now),
                card_in(3, CardPracticeState::Due, later, now),
                card_in(4, CardPracticeState::Suspended, now, now),
            ],
            clock,
        );

        let stats = collection.stats().unwrap();
        assert_eq!(
            stats,
            CollectionStats {
                total_cards: 4,
                new_cards: 1,
                learning_cards: 1,
                due_cards: 1,
                suspended_cards: 1,
                dismissed_cards: 0,
                due_now: 2,
                average_ease: 2.5,
            }
        );
    }
}
