use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scheduling record per distinct question ever encountered.
///
/// Serialized field names are the stable storage contract; do not rename
/// without a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub question_id: String,
    pub topic: String,
    pub ease_factor: f64,
    /// Days until the next review. `0` means review again within this session.
    pub interval: u32,
    /// Streak of consecutive correct (quality >= 3) answers.
    pub repetitions: u32,
    pub next_review: DateTime<Utc>,
    pub last_review: Option<DateTime<Utc>>,
    pub history: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub timestamp: DateTime<Utc>,
    /// 0 = total blackout, 5 = perfect recall.
    pub quality: u8,
    pub correct: bool,
}

/// One log entry per answered question per attempt. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetacognitionEntry {
    pub question_id: String,
    pub topic: String,
    /// Stated confidence before answering, 1-5.
    pub confidence: u8,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
    pub calibration: Calibration,
}

/// Agreement between stated confidence and actual correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calibration {
    Overconfident,
    Underconfident,
    Calibrated,
}

impl Calibration {
    pub fn label(&self) -> &'static str {
        match self {
            Calibration::Overconfident => "Overconfident",
            Calibration::Underconfident => "Underconfident",
            Calibration::Calibrated => "Calibrated",
        }
    }
}

/// Feedback record surfaced to the presentation layer after an answer.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationFeedback {
    pub emoji: &'static str,
    pub message: &'static str,
    pub tip: &'static str,
}

/// External, read-only content. The engine never inspects anything beyond
/// `id`, `topic` and `difficulty`; remaining fields ride along untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub topic: String,
    pub difficulty: String,
    #[serde(flatten)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
