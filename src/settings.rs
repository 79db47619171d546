use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::fusion::FusionWeights;

/// Tunables for the fusion/session pipeline. All of these can be overridden
/// through the settings file without touching fusion logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    /// Per-modality reliability weights used by every fusion call.
    pub weights: FusionWeights,
    /// Classify only every Nth captured frame on the live path.
    pub frame_interval: u32,
    /// Minimum wall-clock spacing between live-path history commits.
    pub commit_interval_secs: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            frame_interval: 30,
            commit_interval_secs: 4.0,
        }
    }
}

impl PipelineSettings {
    /// Structural validation, run before the pipeline starts. An invalid
    /// configuration is fatal; nothing downstream re-checks these.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("text", self.weights.text),
            ("audio", self.weights.audio),
            ("face", self.weights.face),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                bail!("{name} weight {weight} is outside [0, 1]");
            }
        }

        if self.frame_interval == 0 {
            bail!("frame_interval must be at least 1");
        }

        if self.commit_interval_secs <= 0.0 {
            bail!(
                "commit_interval_secs must be positive, got {}",
                self.commit_interval_secs
            );
        }

        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PipelineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse settings at {}", path.display()))?
        } else {
            PipelineSettings::default()
        };

        data.validate()
            .with_context(|| format!("invalid settings at {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn pipeline(&self) -> PipelineSettings {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, settings: PipelineSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &PipelineSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write settings to {}", self.path.display()))
    }
}
