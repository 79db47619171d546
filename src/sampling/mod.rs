use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::session::SessionContext;

mod loop_worker;

pub use loop_worker::{FaceClassifier, Frame, SamplingParams, VideoSource};

use loop_worker::sampling_loop;

/// Starts and stops the live face-sampling loop. Stopping simply cancels the
/// loop and joins it; each sample cycle is short-lived, so there is nothing
/// in flight to abort.
pub struct SamplingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        db: Database,
        session: Arc<Mutex<SessionContext>>,
        params: SamplingParams,
        source: Box<dyn VideoSource>,
        classifier: Arc<dyn FaceClassifier>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("live sampling already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(sampling_loop(
            db,
            session,
            params,
            source,
            classifier,
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("Live sampling started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SamplingController {
    fn default() -> Self {
        Self::new()
    }
}
