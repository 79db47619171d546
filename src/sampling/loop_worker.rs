use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use log::{error, info};

use crate::db::Database;
use crate::fusion::{fuse, FusionWeights};
use crate::models::{EmotionRecord, Observation};
use crate::session::SessionContext;

// Capture cadence of the live loop, ~15 fps. Inference and commits are
// throttled separately below this rate.
const FRAME_TICK_MS: u64 = 66;

/// One captured video frame as opaque encoded bytes. Decoding, resizing and
/// face detection all belong to the classifier behind the trait.
pub type Frame = Vec<u8>;

/// The live video feed. `next_frame` returns `None` when no frame is
/// available this tick; `is_streaming` reports whether the source is
/// actively playing, which gates history commits.
pub trait VideoSource: Send {
    fn is_streaming(&self) -> bool;
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Face-emotion classifier. Infallible by contract: it runs inside the
/// capture loop, so any internal failure must surface as `None` rather
/// than an error.
pub trait FaceClassifier: Send + Sync {
    fn classify(&self, frame: &[u8]) -> Option<Observation>;
}

/// Tuning for one run of the sampling loop, derived from pipeline settings.
#[derive(Debug, Clone)]
pub struct SamplingParams {
    /// Classify only every Nth captured frame.
    pub frame_interval: u32,
    /// Minimum wall-clock spacing between committed history records.
    pub commit_interval: Duration,
    pub weights: FusionWeights,
}

pub(super) async fn sampling_loop(
    db: Database,
    session: Arc<Mutex<SessionContext>>,
    params: SamplingParams,
    mut source: Box<dyn VideoSource>,
    classifier: Arc<dyn FaceClassifier>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_TICK_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = sample_once(
                    &db,
                    &session,
                    &params,
                    source.as_mut(),
                    &classifier,
                    &mut frame_count,
                    Instant::now(),
                );

                if let Err(err) = cycle.await {
                    error!("live sampling cycle failed: {err:?}");
                }
            }
            _ = cancel_token.cancelled() => {
                info!("live sampling loop shutting down");
                break;
            }
        }
    }
}

/// One capture cycle: pull a frame, maybe classify it, maybe commit a fused
/// result. Split from the loop so tests can drive it with controlled time.
pub(crate) async fn sample_once(
    db: &Database,
    session: &Arc<Mutex<SessionContext>>,
    params: &SamplingParams,
    source: &mut dyn VideoSource,
    classifier: &Arc<dyn FaceClassifier>,
    frame_count: &mut u64,
    now: Instant,
) -> Result<()> {
    let Some(frame) = source.next_frame() else {
        return Ok(());
    };
    *frame_count += 1;

    if *frame_count % u64::from(params.frame_interval) == 0 {
        let classifier = Arc::clone(classifier);
        let observation = tokio::task::spawn_blocking(move || classifier.classify(&frame))
            .await
            .context("face classification worker join failed")?;

        // An empty detection keeps the last-known-good observation.
        if let Some(observation) = observation {
            session.lock().await.update_live_face(observation);
        }
    }

    if !source.is_streaming() {
        return Ok(());
    }

    try_commit(db, session, params, now).await
}

/// Commit the cached face observation through fusion, if the gate is open.
/// No cached observation means the gate never opens, which is the expected
/// idle behavior, not an error.
async fn try_commit(
    db: &Database,
    session: &Arc<Mutex<SessionContext>>,
    params: &SamplingParams,
    now: Instant,
) -> Result<()> {
    let face = {
        let guard = session.lock().await;
        if !guard.commit_allowed(now, params.commit_interval) {
            return Ok(());
        }
        match guard.live_face() {
            Some(observation) => observation.clone(),
            None => return Ok(()),
        }
    };

    let result = fuse(None, None, Some(&face), &params.weights)?;
    let Some(label) = result.label else {
        return Ok(());
    };

    let record = EmotionRecord {
        timestamp: Utc::now(),
        emotion: label,
    };
    db.append_emotion(&record).await?;
    session.lock().await.record_commit(now);

    Ok(())
}
