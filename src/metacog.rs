//! Metacognition log: confidence/correctness pairs and their calibration.
//!
//! Entries are immutable and the log is append-only; aggregation here feeds
//! both the adaptive session composer and the `calibration` dashboard view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Calibration, CalibrationFeedback, MetacognitionEntry};

/// High confidence is 4-5, low confidence is 1-2; 3 is always calibrated.
pub fn classify(confidence: u8, correct: bool) -> Calibration {
    match (confidence, correct) {
        (4..=5, false) => Calibration::Overconfident,
        (1..=2, true) => Calibration::Underconfident,
        _ => Calibration::Calibrated,
    }
}

pub fn create_entry(
    question_id: &str,
    topic: &str,
    confidence: u8,
    correct: bool,
    now: DateTime<Utc>,
) -> MetacognitionEntry {
    MetacognitionEntry {
        question_id: question_id.to_string(),
        topic: topic.to_string(),
        confidence,
        correct,
        timestamp: now,
        calibration: classify(confidence, correct),
    }
}

pub fn calibration_feedback(calibration: Calibration) -> CalibrationFeedback {
    match calibration {
        Calibration::Overconfident => CalibrationFeedback {
            emoji: "🤔",
            message: "You were sure, but missed this one.",
            tip: "Before answering, ask yourself what would make you wrong.",
        },
        Calibration::Underconfident => CalibrationFeedback {
            emoji: "💪",
            message: "You knew more than you thought!",
            tip: "Trust your first instinct more often; your recall is better than it feels.",
        },
        Calibration::Calibrated => CalibrationFeedback {
            emoji: "🎯",
            message: "Your confidence matched the outcome.",
            tip: "Well judged. Keep checking in with yourself before each answer.",
        },
    }
}

/// Error rate for one topic, with the sample size retained so consumers can
/// apply their own noise floor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TopicErrorRate {
    pub total: usize,
    pub errors: usize,
    pub error_rate: f64,
}

pub fn topic_error_rates(entries: &[MetacognitionEntry]) -> HashMap<String, TopicErrorRate> {
    let mut rates: HashMap<String, TopicErrorRate> = HashMap::new();
    for entry in entries {
        let rate = rates.entry(entry.topic.clone()).or_insert(TopicErrorRate {
            total: 0,
            errors: 0,
            error_rate: 0.0,
        });
        rate.total += 1;
        if !entry.correct {
            rate.errors += 1;
        }
    }
    for rate in rates.values_mut() {
        rate.error_rate = rate.errors as f64 / rate.total as f64;
    }
    rates
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CalibrationSummary {
    pub total: usize,
    pub overconfident: usize,
    pub underconfident: usize,
    pub calibrated: usize,
}

pub fn calibration_summary(entries: &[MetacognitionEntry]) -> CalibrationSummary {
    let mut summary = CalibrationSummary {
        total: entries.len(),
        ..Default::default()
    };
    for entry in entries {
        match entry.calibration {
            Calibration::Overconfident => summary.overconfident += 1,
            Calibration::Underconfident => summary.underconfident += 1,
            Calibration::Calibrated => summary.calibrated += 1,
        }
    }
    summary
}
