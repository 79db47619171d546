//! Decision-level fusion: combine per-modality observations into one
//! consensus emotion via weighted confidence scoring.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::Observation;

/// Fixed reliability weight per modality. The same weights apply no matter
/// how many modalities contributed to a given call; absent modalities do
/// not cause renormalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionWeights {
    pub text: f64,
    pub audio: f64,
    pub face: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        // Semantic text is the most reliable signal, then visual, then tone.
        Self {
            text: 0.5,
            audio: 0.2,
            face: 0.3,
        }
    }
}

/// Outcome of one fusion call.
///
/// `scores` keeps accumulation order (text, then audio, then face), which is
/// what makes the argmax tie-break deterministic: the first label to reach
/// the maximum wins.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionResult {
    pub label: Option<String>,
    pub scores: Vec<(String, f64)>,
}

impl FusionResult {
    pub fn score(&self, label: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, score)| *score)
    }
}

/// Fuse up to three modality observations into a consensus label.
///
/// Each present observation contributes `weight * score` to its label's
/// accumulated total; the same label from two modalities sums. With zero
/// observations the result is `label: None` with an empty score map, which
/// is a defined no-op rather than an error. A confidence outside `[0, 1]`
/// is a contract violation and is rejected.
pub fn fuse(
    text: Option<&Observation>,
    audio: Option<&Observation>,
    face: Option<&Observation>,
    weights: &FusionWeights,
) -> Result<FusionResult> {
    let mut scores: Vec<(String, f64)> = Vec::new();

    for (modality, weight, observation) in [
        ("text", weights.text, text),
        ("audio", weights.audio, audio),
        ("face", weights.face, face),
    ] {
        let Some(observation) = observation else {
            continue;
        };

        if !(0.0..=1.0).contains(&observation.score) {
            bail!(
                "{} observation score {} is outside [0, 1]",
                modality,
                observation.score
            );
        }

        accumulate(&mut scores, &observation.label, weight * observation.score);
    }

    // First label to reach the maximum wins; a strict comparison keeps
    // ties on the earlier-considered modality.
    let mut label: Option<&String> = None;
    let mut best = f64::NEG_INFINITY;
    for (candidate, total) in &scores {
        if *total > best {
            best = *total;
            label = Some(candidate);
        }
    }

    Ok(FusionResult {
        label: label.cloned(),
        scores,
    })
}

fn accumulate(scores: &mut Vec<(String, f64)>, label: &str, contribution: f64) {
    if let Some((_, total)) = scores.iter_mut().find(|(candidate, _)| candidate == label) {
        *total += contribution;
    } else {
        scores.push((label.to_string(), contribution));
    }
}
