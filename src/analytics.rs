//! Session analytics derived from the persisted emotion history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::EmotionRecord;

/// One point on the chronological emotion timeline. `code` is a per-label
/// integer category for charting, stable within one summary (first-seen
/// order over the sorted timeline) but arbitrary across summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub timestamp: DateTime<Utc>,
    pub emotion: String,
    pub code: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionSummary {
    /// Occurrence count per label, order-insensitive.
    pub distribution: HashMap<String, u64>,
    /// Records sorted by timestamp ascending.
    pub timeline: Vec<TimelinePoint>,
    /// Label with the highest occurrence count. Ties resolve to the label
    /// that first appears in the sorted timeline.
    pub dominant: String,
}

/// Summarize the emotion history. An empty history yields `None`; callers
/// render that as "no data yet" rather than an error.
pub fn summarize(records: &[EmotionRecord]) -> Option<EmotionSummary> {
    if records.is_empty() {
        return None;
    }

    let mut sorted: Vec<&EmotionRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.timestamp);

    let mut codes: HashMap<&str, i64> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    let mut distribution: HashMap<String, u64> = HashMap::new();
    let mut timeline = Vec::with_capacity(sorted.len());

    for record in &sorted {
        let code = match codes.get(record.emotion.as_str()) {
            Some(code) => *code,
            None => {
                let code = first_seen.len() as i64;
                codes.insert(&record.emotion, code);
                first_seen.push(&record.emotion);
                code
            }
        };

        *distribution.entry(record.emotion.clone()).or_insert(0) += 1;
        timeline.push(TimelinePoint {
            timestamp: record.timestamp,
            emotion: record.emotion.clone(),
            code,
        });
    }

    // Scan in first-appearance order so ties break deterministically.
    let mut dominant = first_seen[0];
    let mut dominant_count = 0;
    for label in &first_seen {
        let count = distribution[*label];
        if count > dominant_count {
            dominant = label;
            dominant_count = count;
        }
    }

    Some(EmotionSummary {
        distribution,
        timeline,
        dominant: dominant.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(secs: i64, emotion: &str) -> EmotionRecord {
        EmotionRecord {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            emotion: emotion.to_string(),
        }
    }

    #[test]
    fn empty_history_yields_no_summary() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn distribution_and_dominant_label() {
        let records = vec![record(0, "Happy"), record(10, "Happy"), record(20, "Sad")];
        let summary = summarize(&records).unwrap();

        assert_eq!(summary.distribution["Happy"], 2);
        assert_eq!(summary.distribution["Sad"], 1);
        assert_eq!(summary.dominant, "Happy");
    }

    #[test]
    fn timeline_is_sorted_with_stable_codes() {
        // Deliberately out of order on input.
        let records = vec![record(20, "Sad"), record(0, "Happy"), record(10, "Sad")];
        let summary = summarize(&records).unwrap();

        let emotions: Vec<&str> = summary
            .timeline
            .iter()
            .map(|point| point.emotion.as_str())
            .collect();
        assert_eq!(emotions, ["Happy", "Sad", "Sad"]);

        // Codes assigned in first-seen order of the sorted sequence, and
        // every occurrence of a label carries the same code.
        assert_eq!(summary.timeline[0].code, 0);
        assert_eq!(summary.timeline[1].code, 1);
        assert_eq!(summary.timeline[2].code, 1);
    }

    #[test]
    fn dominant_tie_breaks_to_first_appearance() {
        let records = vec![
            record(5, "Fear"),
            record(0, "Angry"),
            record(10, "Fear"),
            record(15, "Angry"),
        ];

        // Angry appears first chronologically; both have count 2.
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.dominant, "Angry");
    }

    #[test]
    fn single_record_summary() {
        let summary = summarize(&[record(0, "Neutral")]).unwrap();
        assert_eq!(summary.dominant, "Neutral");
        assert_eq!(summary.timeline.len(), 1);
        assert_eq!(summary.distribution.len(), 1);
    }
}
