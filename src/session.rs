//! Practice session composition.
//!
//! Two strategies: interleaved (filter, shuffle, take) and adaptive
//! (weight topics by historical error rate, sample without replacement).
//! Callers own the RNG, so sessions are reproducible under a seeded one
//! and independent sessions never share hidden state.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::metacog::topic_error_rates;
use crate::models::{MetacognitionEntry, Question};

/// Topics with fewer samples than this keep a neutral weight; their error
/// rate is statistical noise.
pub const MIN_TOPIC_SAMPLES: usize = 3;

/// Mixes questions across topics in random order.
///
/// Empty `topics`/`difficulties` filters mean no constraint. The shuffle
/// covers the whole filtered pool before truncation, so filter order leaves
/// no bias in the result.
pub fn interleaved_session(
    pool: &[Question],
    count: usize,
    topics: &[String],
    difficulties: &[String],
    rng: &mut impl Rng,
) -> Vec<Question> {
    let mut filtered: Vec<Question> = pool
        .iter()
        .filter(|q| topics.is_empty() || topics.contains(&q.topic))
        .filter(|q| difficulties.is_empty() || difficulties.contains(&q.difficulty))
        .cloned()
        .collect();

    filtered.shuffle(rng);
    filtered.truncate(count);
    filtered
}

/// Weights questions toward topics the learner has been getting wrong.
///
/// A topic with at least [`MIN_TOPIC_SAMPLES`] logged attempts contributes a
/// weight of `1 + error_rate * 2`, so a fully-failed topic is drawn up to
/// three times as often as a fully-correct one. Sampling is without
/// replacement; the selection is re-shuffled afterwards so early (heavy)
/// draws do not cluster at the front.
pub fn adaptive_session(
    pool: &[Question],
    entries: &[MetacognitionEntry],
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Question> {
    let rates = topic_error_rates(entries);

    let mut candidates: Vec<(Question, f64)> = pool
        .iter()
        .map(|q| {
            let weight = match rates.get(&q.topic) {
                Some(rate) if rate.total >= MIN_TOPIC_SAMPLES => 1.0 + rate.error_rate * 2.0,
                _ => 1.0,
            };
            (q.clone(), weight)
        })
        .collect();

    let mut selected = Vec::with_capacity(count.min(candidates.len()));
    while selected.len() < count && !candidates.is_empty() {
        let total_weight: f64 = candidates.iter().map(|(_, w)| w).sum();
        let mut draw = rng.gen::<f64>() * total_weight;

        let mut picked = candidates.len() - 1;
        for (i, (_, weight)) in candidates.iter().enumerate() {
            draw -= weight;
            if draw <= 0.0 {
                picked = i;
                break;
            }
        }

        selected.push(candidates.remove(picked).0);
    }

    selected.shuffle(rng);
    selected
}

/// Diagnostic tally of questions per topic; no side effects.
pub fn session_distribution(questions: &[Question]) -> HashMap<String, usize> {
    let mut distribution = HashMap::new();
    for q in questions {
        *distribution.entry(q.topic.clone()).or_insert(0) += 1;
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metacog::create_entry;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn question(id: &str, topic: &str, difficulty: &str) -> Question {
        Question {
            id: id.to_string(),
            topic: topic.to_string(),
            difficulty: difficulty.to_string(),
            content: serde_json::Map::new(),
        }
    }

    fn pool_of(counts: &[(&str, usize)]) -> Vec<Question> {
        let mut pool = vec![];
        for (topic, n) in counts {
            for i in 0..*n {
                pool.push(question(&format!("{}-{}", topic, i), topic, "medium"));
            }
        }
        pool
    }

    fn entries_for(topic: &str, total: usize, errors: usize) -> Vec<MetacognitionEntry> {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        (0..total)
            .map(|i| create_entry("q", topic, 3, i >= errors, now))
            .collect()
    }

    mod interleaved_tests {
        use super::*;

        #[test]
        fn respects_count() {
            let pool = pool_of(&[("a", 10)]);
            let mut rng = StdRng::seed_from_u64(1);
            let session = interleaved_session(&pool, 4, &[], &[], &mut rng);
            assert_eq!(session.len(), 4);
        }

        #[test]
        fn smaller_pool_returns_everything_without_padding() {
            let pool = pool_of(&[("a", 3)]);
            let mut rng = StdRng::seed_from_u64(1);
            let session = interleaved_session(&pool, 10, &[], &[], &mut rng);
            assert_eq!(session.len(), 3);
        }

        #[test]
        fn empty_pool_gives_empty_session() {
            let mut rng = StdRng::seed_from_u64(1);
            assert!(interleaved_session(&[], 5, &[], &[], &mut rng).is_empty());
        }

        #[test]
        fn topic_filter_is_applied() {
            let pool = pool_of(&[("algebra", 5), ("geometry", 5)]);
            let mut rng = StdRng::seed_from_u64(1);
            let session =
                interleaved_session(&pool, 10, &["algebra".to_string()], &[], &mut rng);
            assert_eq!(session.len(), 5);
            assert!(session.iter().all(|q| q.topic == "algebra"));
        }

        #[test]
        fn difficulty_filter_is_applied() {
            let mut pool = pool_of(&[("a", 4)]);
            pool.push(question("hard-1", "a", "hard"));
            let mut rng = StdRng::seed_from_u64(1);
            let session =
                interleaved_session(&pool, 10, &[], &["hard".to_string()], &mut rng);
            assert_eq!(session.len(), 1);
            assert_eq!(session[0].id, "hard-1");
        }

        #[test]
        fn no_duplicate_ids() {
            let pool = pool_of(&[("a", 20)]);
            let mut rng = StdRng::seed_from_u64(7);
            let session = interleaved_session(&pool, 20, &[], &[], &mut rng);
            let ids: HashSet<&str> = session.iter().map(|q| q.id.as_str()).collect();
            assert_eq!(ids.len(), session.len());
        }

        #[test]
        fn order_varies_across_seeds() {
            let pool = pool_of(&[("a", 12)]);
            let first: Vec<String> = {
                let mut rng = StdRng::seed_from_u64(1);
                interleaved_session(&pool, 12, &[], &[], &mut rng)
                    .into_iter()
                    .map(|q| q.id)
                    .collect()
            };
            let second: Vec<String> = {
                let mut rng = StdRng::seed_from_u64(2);
                interleaved_session(&pool, 12, &[], &[], &mut rng)
                    .into_iter()
                    .map(|q| q.id)
                    .collect()
            };
            assert_ne!(first, second);
        }
    }

    mod adaptive_tests {
        use super::*;

        #[test]
        fn empty_pool_gives_empty_session() {
            let mut rng = StdRng::seed_from_u64(1);
            assert!(adaptive_session(&[], &[], 5, &mut rng).is_empty());
        }

        #[test]
        fn samples_without_replacement() {
            let pool = pool_of(&[("a", 6), ("b", 6)]);
            let entries = entries_for("a", 5, 5);
            let mut rng = StdRng::seed_from_u64(3);
            let session = adaptive_session(&pool, &entries, 12, &mut rng);
            let ids: HashSet<&str> = session.iter().map(|q| q.id.as_str()).collect();
            assert_eq!(session.len(), 12);
            assert_eq!(ids.len(), 12);
        }

        #[test]
        fn exhausted_pool_returns_all_available() {
            let pool = pool_of(&[("a", 4)]);
            let mut rng = StdRng::seed_from_u64(3);
            let session = adaptive_session(&pool, &[], 10, &mut rng);
            assert_eq!(session.len(), 4);
        }

        #[test]
        fn under_sampled_topics_stay_neutral() {
            // Two entries for "a" is below the sample floor: both topics get
            // weight 1 and the split should be near even over many draws.
            let pool = pool_of(&[("a", 1), ("b", 1)]);
            let entries = entries_for("a", 2, 2);
            let mut rng = StdRng::seed_from_u64(11);

            let mut a_picks = 0;
            for _ in 0..2000 {
                let session = adaptive_session(&pool, &entries, 1, &mut rng);
                if session[0].topic == "a" {
                    a_picks += 1;
                }
            }
            let ratio = a_picks as f64 / 2000.0;
            assert!(
                (0.45..=0.55).contains(&ratio),
                "expected near-even split, got {}",
                ratio
            );
        }

        #[test]
        fn failing_topic_is_drawn_up_to_three_times_as_often() {
            // "weak" has a 100% error rate over >=3 samples (weight 3),
            // "strong" a 0% rate (weight 1): expect ~3:1 in the long run.
            let pool = pool_of(&[("weak", 1), ("strong", 1)]);
            let mut entries = entries_for("weak", 4, 4);
            entries.extend(entries_for("strong", 4, 0));
            let mut rng = StdRng::seed_from_u64(17);

            let mut weak_picks = 0;
            let draws = 4000;
            for _ in 0..draws {
                let session = adaptive_session(&pool, &entries, 1, &mut rng);
                if session[0].topic == "weak" {
                    weak_picks += 1;
                }
            }

            // Expected probability 3/4; allow generous sampling slack.
            let ratio = weak_picks as f64 / draws as f64;
            assert!(
                (0.70..=0.80).contains(&ratio),
                "expected ~0.75 weak-topic share, got {}",
                ratio
            );
        }

        #[test]
        fn respects_count() {
            let pool = pool_of(&[("a", 30)]);
            let mut rng = StdRng::seed_from_u64(5);
            let session = adaptive_session(&pool, &[], 8, &mut rng);
            assert_eq!(session.len(), 8);
        }
    }

    mod distribution_tests {
        use super::*;

        #[test]
        fn tallies_by_topic() {
            let pool = pool_of(&[("a", 3), ("b", 2)]);
            let distribution = session_distribution(&pool);
            assert_eq!(distribution.get("a"), Some(&3));
            assert_eq!(distribution.get("b"), Some(&2));
            assert_eq!(distribution.len(), 2);
        }

        #[test]
        fn empty_session_gives_empty_tally() {
            assert!(session_distribution(&[]).is_empty());
        }
    }
}
