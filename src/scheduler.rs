//! SM-2-derived scheduling over review cards.
//!
//! Every function here is a pure transition: cards come in by reference,
//! updated values come out, and the clock is an explicit argument. Callers
//! clamp `quality` to 0-5 before handing it over.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{ReviewCard, ReviewRecord};

pub const INITIAL_EASE: f64 = 2.5;
pub const MINIMUM_EASE: f64 = 1.3;

/// Quality at or above this counts as a correct recall.
pub const CORRECT_THRESHOLD: u8 = 3;

/// Lazily created on first encounter; never pre-allocated for unseen questions.
pub fn create_card(question_id: &str, topic: &str, now: DateTime<Utc>) -> ReviewCard {
    ReviewCard {
        question_id: question_id.to_string(),
        topic: topic.to_string(),
        ease_factor: INITIAL_EASE,
        interval: 0,
        repetitions: 0,
        next_review: now,
        last_review: None,
        history: vec![],
    }
}

/// Computes the next card state for a quality rating (0-5).
///
/// Correct answers (quality >= 3) walk the 1 day / 3 days / round(interval * ease)
/// ladder; anything below resets the streak and re-queues the card within the
/// session. The ease floor of 1.3 is enforced unconditionally.
pub fn calculate_next_review(card: &ReviewCard, quality: u8, now: DateTime<Utc>) -> ReviewCard {
    let correct = quality >= CORRECT_THRESHOLD;

    let mut history = card.history.clone();
    history.push(ReviewRecord {
        timestamp: now,
        quality,
        correct,
    });

    // Interval uses the ease factor as it stood before this review.
    let (interval, repetitions) = if correct {
        let interval = match card.repetitions {
            0 => 1,
            1 => 3,
            _ => (card.interval as f64 * card.ease_factor).round() as u32,
        };
        (interval, card.repetitions + 1)
    } else {
        (0, 0)
    };

    let q = quality as f64;
    let ease_factor =
        (card.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MINIMUM_EASE);

    let next_review = if interval == 0 {
        now + Duration::minutes(10)
    } else {
        now + Duration::days(interval as i64)
    };

    ReviewCard {
        question_id: card.question_id.clone(),
        topic: card.topic.clone(),
        ease_factor,
        interval,
        repetitions,
        next_review,
        last_review: Some(now),
        history,
    }
}

pub fn is_due(card: &ReviewCard, now: DateTime<Utc>) -> bool {
    now >= card.next_review
}

/// Due cards, most overdue first; ties go to the shorter interval so fragile,
/// recently-learned cards surface before settled ones.
pub fn due_cards(cards: &[ReviewCard], now: DateTime<Utc>) -> Vec<&ReviewCard> {
    let mut due: Vec<&ReviewCard> = cards.iter().filter(|c| is_due(c, now)).collect();
    due.sort_by(|a, b| {
        let overdue_a = now - a.next_review;
        let overdue_b = now - b.next_review;
        overdue_b
            .cmp(&overdue_a)
            .then(a.interval.cmp(&b.interval))
    });
    due
}

#[derive(Debug, Clone, Serialize)]
pub struct DeckStats {
    pub total: usize,
    pub due: usize,
    /// repetitions < 2
    pub learning: usize,
    /// 2 <= repetitions < 5
    pub reviewing: usize,
    /// repetitions >= 5
    pub mature: usize,
    /// Percent of correct history entries across the deck, one decimal.
    pub accuracy: f64,
    /// Consecutive calendar days with at least one review, ending today or yesterday.
    pub streak: u32,
}

pub fn deck_stats(cards: &[ReviewCard], now: DateTime<Utc>) -> DeckStats {
    let total = cards.len();
    let due = cards.iter().filter(|c| is_due(c, now)).count();
    let learning = cards.iter().filter(|c| c.repetitions < 2).count();
    let reviewing = cards
        .iter()
        .filter(|c| c.repetitions >= 2 && c.repetitions < 5)
        .count();
    let mature = cards.iter().filter(|c| c.repetitions >= 5).count();

    let total_reviews: usize = cards.iter().map(|c| c.history.len()).sum();
    let correct_reviews: usize = cards
        .iter()
        .map(|c| c.history.iter().filter(|r| r.correct).count())
        .sum();
    let accuracy = if total_reviews == 0 {
        0.0
    } else {
        let pct = correct_reviews as f64 / total_reviews as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    };

    DeckStats {
        total,
        due,
        learning,
        reviewing,
        mature,
        accuracy,
        streak: review_streak(cards, now),
    }
}

fn review_streak(cards: &[ReviewCard], now: DateTime<Utc>) -> u32 {
    let review_days: HashSet<i32> = cards
        .iter()
        .flat_map(|c| c.history.iter())
        .map(|r| r.timestamp.date_naive().num_days_from_ce())
        .collect();

    let Some(&most_recent) = review_days.iter().max() else {
        return 0;
    };

    let today = now.date_naive().num_days_from_ce();
    if most_recent < today - 1 {
        return 0;
    }

    let mut streak = 0;
    let mut day = most_recent;
    while review_days.contains(&day) {
        streak += 1;
        day -= 1;
    }
    streak
}
