mod common;

use common::{clock, collection, new_card, reviewed_card};
use pretty_assertions::assert_eq;
use review_core::{
    Card, CardPracticeState, Clock, CollectionConfig, Duration, Grade, StateFilter,
};

fn exactly_one_state(card: &Card) {
    let flags = [
        card.is_new(),
        card.is_learning(),
        card.is_due(),
        card.is_dismissed(),
        card.is_suspended(),
    ];
    assert_eq!(flags.iter().filter(|f| **f).count(), 1, "card {:?}", card.state());
}

/// Deterministic pseudo-random grade stream.
fn grades(seed: u64, len: usize) -> Vec<Grade> {
    let mut x = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            Grade::ALL[(x % 6) as usize]
        })
        .collect()
}

#[test]
fn invariants_hold_over_long_answer_sequences() {
    let config = CollectionConfig::default();
    for seed in 0..50 {
        let clock = clock();
        let mut card = new_card(1, clock.now());
        for grade in grades(seed, 200) {
            card.answer(grade, &config, clock.now()).unwrap();
            exactly_one_state(&card);
            assert!(card.ease_factor() >= config.ease_factor_floor());
            assert!(card.interval() >= Duration::ZERO);
            assert!(card.interval() <= config.maximum_interval());
            assert!(card.due_at() >= clock.now());
            clock.set(card.due_at());
        }
    }
}

#[test]
fn preview_is_pure() {
    let config = CollectionConfig::default();
    let clock = clock();
    let mut card = new_card(1, clock.now());
    card.answer(Grade::Good, &config, clock.now()).unwrap();
    let snapshot = card.clone();

    let first = card.compute_grades(&config, clock.now()).unwrap();
    let second = card.compute_grades(&config, clock.now()).unwrap();
    assert_eq!(first, second);
    assert_eq!(card, snapshot);
}

#[test]
fn graduation_after_exactly_len_learning_steps() {
    let steps = vec![
        Duration::from_minutes(1),
        Duration::from_minutes(10),
        Duration::from_hours(1),
        Duration::from_hours(4),
    ];
    let config = CollectionConfig::builder()
        .learning_steps(steps.clone())
        .build()
        .unwrap();
    let clock = clock();
    let mut card = new_card(1, clock.now());

    for i in 1..=steps.len() {
        card.answer(Grade::Good, &config, clock.now()).unwrap();
        if i < steps.len() {
            assert!(card.is_learning(), "graduated early at answer {}", i);
            assert_eq!(card.interval(), steps[i]);
        } else {
            assert!(card.is_due(), "not graduated after {} answers", i);
        }
        clock.set(card.due_at());
    }
}

#[test]
fn single_step_graduates_on_first_good() {
    let config = CollectionConfig::builder()
        .learning_steps(vec![Duration::from_minutes(5)])
        .build()
        .unwrap();
    let clock = clock();
    let mut card = new_card(1, clock.now());
    card.answer(Grade::Good, &config, clock.now()).unwrap();
    assert!(card.is_due());
}

#[test]
fn severe_lapse_costs_at_least_plain_fail() {
    let config = CollectionConfig::default();
    let clock = clock();
    let due = reviewed_card(1, CardPracticeState::Due, clock.now());

    let mut severe = due.clone();
    severe.answer(Grade::FailSevere, &config, clock.now()).unwrap();
    let mut plain = due.clone();
    plain.answer(Grade::Fail, &config, clock.now()).unwrap();

    assert!(due.ease_factor() - severe.ease_factor() >= due.ease_factor() - plain.ease_factor());
    for card in [&severe, &plain] {
        assert!(card.is_learning());
        assert_eq!(card.learning_step(), 0);
        assert_eq!(card.lapse_count(), 1);
        assert_eq!(card.due_at(), clock.now() + chrono::Duration::minutes(1));
    }
}

#[test]
fn queue_orders_new_first_then_by_due_time() {
    let clock = clock();
    let t = clock.now();
    let collection = collection(
        vec![
            reviewed_card(1, CardPracticeState::Due, t + chrono::Duration::seconds(10)),
            reviewed_card(2, CardPracticeState::Due, t + chrono::Duration::seconds(5)),
            reviewed_card(3, CardPracticeState::Due, t + chrono::Duration::seconds(20)),
            new_card(4, t),
        ],
        clock.clone(),
    );
    clock.advance(Duration::from_seconds(20));

    let order: Vec<i64> = collection.due_cards().unwrap().map(|c| c.id()).collect();
    assert_eq!(order, vec![4, 2, 1, 3]);
}

#[test]
fn queue_is_restartable() {
    let clock = clock();
    let t = clock.now();
    let collection = collection(vec![new_card(1, t), new_card(2, t)], clock);

    let first: Vec<i64> = collection.due_cards().unwrap().map(|c| c.id()).collect();
    let second: Vec<i64> = collection.due_cards().unwrap().map(|c| c.id()).collect();
    assert_eq!(first, second);
}

#[test]
fn count_scenario() {
    let clock = clock();
    let t = clock.now();
    let collection = collection(
        vec![
            new_card(1, t),
            new_card(2, t),
            reviewed_card(3, CardPracticeState::Learning, t),
            reviewed_card(4, CardPracticeState::Due, t + chrono::Duration::days(2)),
            reviewed_card(5, CardPracticeState::Suspended, t),
        ],
        clock,
    );

    assert_eq!(collection.count().unwrap(), 3);
    assert_eq!(collection.count_by_state(StateFilter::SUSPENDED).unwrap(), 1);
    assert_eq!(collection.count_by_state(StateFilter::NEW).unwrap(), 2);
    assert_eq!(collection.count_by_state(StateFilter::LEARNING).unwrap(), 1);
    assert_eq!(collection.count_by_state(StateFilter::DUE).unwrap(), 0);
}

#[test]
fn future_card_becomes_due_as_time_passes() {
    let clock = clock();
    let t = clock.now();
    let collection = collection(
        vec![reviewed_card(1, CardPracticeState::Due, t + chrono::Duration::seconds(1))],
        clock.clone(),
    );

    assert_eq!(collection.count().unwrap(), 0);
    clock.advance(Duration::from_seconds(1));
    assert_eq!(collection.count().unwrap(), 1);
}

#[test]
fn full_review_session() {
    let clock = clock();
    let t = clock.now();
    let collection = collection(vec![new_card(1, t), new_card(2, t)], clock.clone());

    while let Some(card) = collection.next_due(1).unwrap().pop() {
        collection.answer(card.id(), Grade::Good).unwrap();
    }
    assert_eq!(collection.count().unwrap(), 0);

    clock.advance(Duration::from_minutes(10));
    for card in collection.next_due(10).unwrap() {
        let previews = collection.preview(card.id()).unwrap();
        assert_eq!(previews[4].state, CardPracticeState::Due);
        collection.answer(card.id(), Grade::Good).unwrap();
    }

    let stats = collection.stats().unwrap();
    assert_eq!(stats.due_cards, 2);
    assert_eq!(collection.source().reviews().len(), 4);
}
