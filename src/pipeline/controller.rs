use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::PipelineError;
use crate::camera::error::CaptureError;
use crate::classify::types::ClassificationResult;
use crate::classify::Classifier;
use crate::diagnostics::stats::{CycleSnapshot, CycleStats, FailureKind};
use crate::notify::dispatcher::NotificationDispatcher;
use crate::notify::types::Notification;
use crate::preview::encode::ImageEncoder;
use crate::preview::snapshot::{FrameCapturer, ImageFrame};

/// Controller state visible to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Capturing,
}

/// How a trigger ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A cycle was already running; nothing happened.
    Ignored,
    Classified(ClassificationResult),
    Failed(FailureKind),
}

/// Holds the controller in `Capturing` for as long as it lives.
///
/// Dropping the guard, on any exit path including unwinding, puts the
/// state back to `Idle`.
struct BusyGuard {
    state: Arc<watch::Sender<PipelineState>>,
}

impl BusyGuard {
    fn acquire(state: &Arc<watch::Sender<PipelineState>>) -> Option<Self> {
        let acquired = state.send_if_modified(|current| {
            if *current == PipelineState::Idle {
                *current = PipelineState::Capturing;
                true
            } else {
                false
            }
        });
        acquired.then(|| Self {
            state: Arc::clone(state),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.send_replace(PipelineState::Idle);
    }
}

/// Runs capture, encode, classify and notify as one single-flight cycle.
///
/// The controller is the only writer of the pipeline state and of the last
/// captured image; other components observe them through `watch` receivers.
pub struct CaptureController {
    capturer: FrameCapturer,
    encoder: ImageEncoder,
    classifier: Arc<dyn Classifier>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    state: Arc<watch::Sender<PipelineState>>,
    last_image: watch::Sender<Option<Arc<ImageFrame>>>,
    stats: Mutex<CycleStats>,
}

impl CaptureController {
    pub fn new(
        capturer: FrameCapturer,
        classifier: Arc<dyn Classifier>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        let (last_image, _) = watch::channel(None);
        Self {
            capturer,
            encoder: ImageEncoder::new(),
            classifier,
            dispatcher,
            state: Arc::new(state),
            last_image,
            stats: Mutex::new(CycleStats::new()),
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.state() == PipelineState::Capturing
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// The most recent successful capture, if any.
    pub fn last_image(&self) -> Option<Arc<ImageFrame>> {
        self.last_image.borrow().clone()
    }

    pub fn subscribe_last_image(&self) -> watch::Receiver<Option<Arc<ImageFrame>>> {
        self.last_image.subscribe()
    }

    pub fn stats(&self) -> CycleSnapshot {
        self.stats.lock().snapshot()
    }

    /// Start a cycle in the background.
    ///
    /// The frame is captured before this returns; only the network part
    /// runs on the spawned task. Returns `None` when a cycle is already in
    /// flight. Must be called from within a Tokio runtime.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<CycleOutcome>> {
        let (guard, captured) = self.begin()?;
        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.finish(guard, captured).await }))
    }

    /// Run a full cycle on the current task.
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.begin() {
            Some((guard, captured)) => self.finish(guard, captured).await,
            None => CycleOutcome::Ignored,
        }
    }

    /// Wait until no cycle is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == PipelineState::Idle).await;
    }

    /// Enter `Capturing` and take the still synchronously.
    fn begin(&self) -> Option<(BusyGuard, Result<Arc<ImageFrame>, CaptureError>)> {
        let Some(guard) = BusyGuard::acquire(&self.state) else {
            self.stats.lock().record_ignored();
            debug!("capture already in progress, ignoring trigger");
            return None;
        };

        let captured = self.capturer.capture().map(Arc::new);
        if let Ok(frame) = &captured {
            debug!("captured {frame:?}");
            self.last_image.send_replace(Some(Arc::clone(frame)));
        }
        Some((guard, captured))
    }

    /// Encode, classify and notify. `_guard` is released when this returns.
    async fn finish(
        &self,
        _guard: BusyGuard,
        captured: Result<Arc<ImageFrame>, CaptureError>,
    ) -> CycleOutcome {
        let (result, latency) = self.submit(captured).await;

        match result {
            Ok(result) => {
                info!(
                    "classified as {} ({}) in {}ms",
                    result.predicted_class,
                    result.confidence_percent(),
                    latency.unwrap_or_default().as_millis()
                );
                self.dispatcher.notify(Notification::for_result(&result));
                self.stats.lock().record_result(
                    result.predicted_class.is_drowsy(),
                    latency.unwrap_or_default(),
                );
                CycleOutcome::Classified(result)
            }
            Err(err) => {
                let kind = err.kind();
                match kind {
                    FailureKind::Malformed => warn!("classification response rejected: {err}"),
                    FailureKind::Request => warn!("classification request failed: {err}"),
                    FailureKind::Capture => warn!("frame capture failed: {err}"),
                }
                self.dispatcher.notify(Notification::processing_failed());
                self.stats.lock().record_failure(kind, latency);
                CycleOutcome::Failed(kind)
            }
        }
    }

    /// The part of the cycle that can fail. Latency covers the request only
    /// and is `None` when the request was never sent.
    async fn submit(
        &self,
        captured: Result<Arc<ImageFrame>, CaptureError>,
    ) -> (Result<ClassificationResult, PipelineError>, Option<Duration>) {
        let payload = match captured.and_then(|frame| self.encoder.encode(&frame)) {
            Ok(payload) => payload,
            Err(e) => return (Err(e.into()), None),
        };

        let start = Instant::now();
        let result = self.classifier.classify(payload).await;
        (result.map_err(PipelineError::from), Some(start.elapsed()))
    }
}
