use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    analytics::{summarize, EmotionSummary},
    db::Database,
    fusion::{fuse, FusionResult},
    models::{EmotionRecord, Observation},
    sampling::{FaceClassifier, SamplingController, SamplingParams, VideoSource},
    session::SessionContext,
    settings::PipelineSettings,
};

/// Orchestration facade over the whole fusion/session core. Owns the durable
/// store, the shared session context and the live sampling loop; both the
/// manual analysis path and the continuous face path run through it.
#[derive(Clone)]
pub struct EmotionPipeline {
    db: Database,
    session: Arc<Mutex<SessionContext>>,
    settings: PipelineSettings,
    sampler: Arc<Mutex<SamplingController>>,
}

impl EmotionPipeline {
    pub fn new(db: Database, settings: PipelineSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            db,
            session: Arc::new(Mutex::new(SessionContext::new())),
            settings,
            sampler: Arc::new(Mutex::new(SamplingController::new())),
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Start the continuous face path against the given video feed.
    pub async fn start_live(
        &self,
        source: Box<dyn VideoSource>,
        classifier: Arc<dyn FaceClassifier>,
    ) -> Result<()> {
        let params = SamplingParams {
            frame_interval: self.settings.frame_interval,
            commit_interval: Duration::from_secs_f64(self.settings.commit_interval_secs),
            weights: self.settings.weights,
        };

        self.sampler.lock().await.start(
            self.db.clone(),
            Arc::clone(&self.session),
            params,
            source,
            classifier,
        )
    }

    /// Stop the continuous face path. New commit attempts simply cease;
    /// nothing in flight needs aborting.
    pub async fn stop_live(&self) -> Result<()> {
        self.sampler.lock().await.stop().await
    }

    pub async fn live_active(&self) -> bool {
        self.sampler.lock().await.is_active()
    }

    /// The most recent live face observation, if any frame has classified.
    pub async fn live_face(&self) -> Option<Observation> {
        self.session.lock().await.live_face().cloned()
    }

    /// Manual analysis: fuse the supplied text/audio observations with the
    /// cached live face reading (no re-classification), and commit the
    /// consensus when one exists. With no observations at all this is a
    /// no-op that returns an empty result.
    ///
    /// Manual commits bypass the live-path commit gate and do not advance
    /// it; the gate only meters the continuous stream.
    pub async fn analyze(
        &self,
        text: Option<Observation>,
        audio: Option<Observation>,
    ) -> Result<FusionResult> {
        let face = self.live_face().await;

        let result = fuse(
            text.as_ref(),
            audio.as_ref(),
            face.as_ref(),
            &self.settings.weights,
        )?;

        if let Some(label) = &result.label {
            let record = EmotionRecord {
                timestamp: Utc::now(),
                emotion: label.clone(),
            };
            self.db.append_emotion(&record).await?;
            info!("Committed consensus emotion '{label}'");
        }

        Ok(result)
    }

    /// Full history in append order.
    pub async fn history(&self) -> Result<Vec<EmotionRecord>> {
        self.db.load_history().await
    }

    /// Analytics over the persisted history; `None` when nothing has been
    /// recorded yet.
    pub async fn summary(&self) -> Result<Option<EmotionSummary>> {
        let history = self.db.load_history().await?;
        Ok(summarize(&history))
    }

    /// First step of the destructive clear: arm the confirmation flag.
    pub async fn request_clear(&self) {
        self.session.lock().await.request_clear();
    }

    pub async fn cancel_clear(&self) {
        self.session.lock().await.cancel_clear();
    }

    pub async fn clear_pending(&self) -> bool {
        self.session.lock().await.clear_pending()
    }

    /// Second step of the destructive clear: wipe the durable history and
    /// reset all in-memory session state. Requires a prior `request_clear`.
    pub async fn confirm_clear(&self) -> Result<()> {
        {
            let guard = self.session.lock().await;
            if !guard.clear_pending() {
                bail!("no clear request pending");
            }
        }

        self.db.clear_history().await?;
        self.session.lock().await.reset();
        warn!("Emotion session cleared");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> (tempfile::TempDir, EmotionPipeline) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("humora.sqlite3")).unwrap();
        let pipeline = EmotionPipeline::new(db, PipelineSettings::default()).unwrap();
        (dir, pipeline)
    }

    #[tokio::test]
    async fn analyze_with_no_observations_writes_nothing() {
        let (_dir, pipeline) = pipeline();

        let result = pipeline.analyze(None, None).await.unwrap();
        assert_eq!(result.label, None);
        assert!(pipeline.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_commits_consensus_label() {
        let (_dir, pipeline) = pipeline();
        let before = Utc::now();

        let result = pipeline
            .analyze(Some(Observation::new("Happy", 0.8)), None)
            .await
            .unwrap();
        assert_eq!(result.label.as_deref(), Some("Happy"));

        let history = pipeline.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].emotion, "Happy");
        assert!(history[0].timestamp >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn analyze_fuses_cached_live_face() {
        let (_dir, pipeline) = pipeline();
        pipeline
            .session
            .lock()
            .await
            .update_live_face(Observation::new("Surprise", 0.9));

        // No text or audio: the cached face reading alone decides.
        let result = pipeline.analyze(None, None).await.unwrap();
        assert_eq!(result.label.as_deref(), Some("Surprise"));
        assert_eq!(pipeline.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_requires_confirmation() {
        let (_dir, pipeline) = pipeline();
        pipeline
            .analyze(Some(Observation::new("Sad", 0.6)), None)
            .await
            .unwrap();

        assert!(pipeline.confirm_clear().await.is_err());
        assert_eq!(pipeline.history().await.unwrap().len(), 1);

        pipeline.request_clear().await;
        assert!(pipeline.clear_pending().await);
        pipeline.confirm_clear().await.unwrap();

        assert!(pipeline.history().await.unwrap().is_empty());
        assert!(pipeline.live_face().await.is_none());
        assert!(!pipeline.clear_pending().await);
    }

    #[tokio::test]
    async fn cancel_leaves_history_intact() {
        let (_dir, pipeline) = pipeline();
        pipeline
            .analyze(Some(Observation::new("Sad", 0.6)), None)
            .await
            .unwrap();

        pipeline.request_clear().await;
        pipeline.cancel_clear().await;

        assert!(!pipeline.clear_pending().await);
        assert!(pipeline.confirm_clear().await.is_err());
        assert_eq!(pipeline.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summary_reflects_history() {
        let (_dir, pipeline) = pipeline();
        assert!(pipeline.summary().await.unwrap().is_none());

        for label in ["Happy", "Happy", "Sad"] {
            pipeline
                .analyze(Some(Observation::new(label, 0.9)), None)
                .await
                .unwrap();
        }

        let summary = pipeline.summary().await.unwrap().unwrap();
        assert_eq!(summary.dominant, "Happy");
        assert_eq!(summary.distribution["Happy"], 2);
        assert_eq!(summary.distribution["Sad"], 1);
    }
}
