//! Core data types shared across the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single modality's prediction: an emotion label plus a confidence
/// score in `[0, 1]`. Produced by a classifier, consumed by fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub label: String,
    pub score: f64,
}

impl Observation {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// One committed consensus result in the durable emotion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecord {
    pub timestamp: DateTime<Utc>,
    pub emotion: String,
}
