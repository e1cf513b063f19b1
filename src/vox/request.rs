//! A single clip fetch+decode, started as soon as it is created.

use crate::audio::buffer::AudioBuffer;
use crate::error::Result;
use crate::vox::decode::ClipDecoder;
use crate::vox::fetch::ClipFetcher;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fetches and decodes vox assets.
#[derive(Clone)]
pub struct ClipLoader {
    fetcher: Arc<dyn ClipFetcher>,
    decoder: Arc<dyn ClipDecoder>,
}

impl ClipLoader {
    pub fn new(fetcher: Arc<dyn ClipFetcher>, decoder: Arc<dyn ClipDecoder>) -> Self {
        Self { fetcher, decoder }
    }

    /// Fetches `path` and decodes it off the async threads.
    pub async fn load(&self, path: &str) -> Result<AudioBuffer> {
        let bytes = self.fetcher.fetch(path).await?;
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| crate::error::VoxError::Decode {
                message: format!("decode task failed: {}", e),
            })?
    }
}

/// How a request settled.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Decoded(Arc<AudioBuffer>),
    Failed(String),
}

/// One in-flight clip.
///
/// Never fails past construction: every error ends in
/// [`RequestOutcome::Failed`], which the engine skips.
pub struct VoxRequest {
    path: String,
    delay: f64,
    forced_rate: Option<f64>,
    outcome: Option<RequestOutcome>,
    rx: oneshot::Receiver<RequestOutcome>,
    task: JoinHandle<()>,
}

impl VoxRequest {
    /// Starts fetching `path` immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(path: String, delay: f64, loader: &ClipLoader) -> Self {
        debug!(path = %path, delay, "vox request");
        let (tx, rx) = oneshot::channel();
        let loader = loader.clone();
        let task_path = path.clone();

        let task = tokio::spawn(async move {
            let outcome = match loader.load(&task_path).await {
                Ok(buffer) => {
                    debug!(path = %task_path, duration = buffer.duration(), "vox request fulfilled");
                    RequestOutcome::Decoded(Arc::new(buffer))
                }
                Err(e) => {
                    warn!(path = %task_path, "vox request failed: {}", e);
                    RequestOutcome::Failed(e.to_string())
                }
            };
            // Receiver gone means the session was torn down.
            if tx.send(outcome).is_err() {
                debug!(path = %task_path, "vox request settled after cancel");
            }
        });

        Self {
            path,
            delay,
            forced_rate: None,
            outcome: None,
            rx,
            task,
        }
    }

    /// Plays this clip at `rate` regardless of the session rate.
    pub fn with_forced_rate(mut self, rate: f64) -> Self {
        self.forced_rate = Some(rate);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Silence to wait before this clip, in seconds at rate 1.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn forced_rate(&self) -> Option<f64> {
        self.forced_rate
    }

    /// Returns true once the request has settled, successfully or not.
    pub fn is_done(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.outcome = Some(RequestOutcome::Failed("request cancelled".to_string()));
                true
            }
        }
    }

    pub fn outcome(&self) -> Option<&RequestOutcome> {
        self.outcome.as_ref()
    }

    /// The decoded clip, if the request settled successfully.
    pub fn buffer(&self) -> Option<&Arc<AudioBuffer>> {
        match &self.outcome {
            Some(RequestOutcome::Decoded(buffer)) => Some(buffer),
            _ => None,
        }
    }

    /// Aborts the fetch. The request then settles as failed.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for VoxRequest {
    fn drop(&mut self) {
        self.task.abort();
    }
}
