use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::camera::error::{CaptureError, Result};
use crate::camera::source::VideoSource;
use crate::camera::types::Frame;

/// Callback type for reporting feed failures to the operator.
/// Arguments: (source_name, error_message).
pub type ErrorCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Frame rate bounds accepted by the feed thread.
const MIN_FPS: f32 = 0.5;
const MAX_FPS: f32 = 60.0;

/// How often [`LiveFeed::wait_until_open`] re-checks the reader.
const OPEN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Thread-safe ring buffer for live frames.
///
/// Stores up to `capacity` frames, overwriting the oldest when full.
/// Frames are wrapped in `Arc` so the capturer gets a cheap reference-counted
/// pointer instead of cloning the pixel buffer.
pub struct FrameBuffer {
    frames: Mutex<Vec<Option<Arc<Frame>>>>,
    capacity: usize,
    write_idx: Mutex<usize>,
    /// Monotonic counter incremented on each push.
    sequence: AtomicU64,
}

impl FrameBuffer {
    /// Create a new ring buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let frames = (0..capacity).map(|_| None).collect();
        Self {
            frames: Mutex::new(frames),
            capacity,
            write_idx: Mutex::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    /// Push a new frame into the buffer, overwriting the oldest if full.
    pub fn push(&self, frame: Frame) {
        if self.capacity == 0 {
            return;
        }
        let mut frames = self.frames.lock();
        let mut idx = self.write_idx.lock();
        frames[*idx] = Some(Arc::new(frame));
        *idx = (*idx + 1) % self.capacity;
        self.sequence.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of frames pushed so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Get the most recently pushed frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        if self.capacity == 0 {
            return None;
        }
        let frames = self.frames.lock();
        let idx = self.write_idx.lock();
        let latest_idx = if *idx == 0 {
            self.capacity - 1
        } else {
            *idx - 1
        };
        frames[latest_idx].clone()
    }
}

/// Configuration for the frame watchdog timer.
struct WatchdogConfig {
    /// Maximum time to wait for the source to open.
    startup_timeout: Duration,
    /// Time to wait for the first frame after the source is open.
    frame_timeout: Duration,
    /// Poll interval for the watchdog thread.
    poll_interval: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            frame_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// A running video source pumping frames into a shared [`FrameBuffer`].
///
/// The feed owns two threads: the reader, which opens the source and polls
/// it at the configured frame rate, and a watchdog, which stops the feed if
/// the source opens but never produces a frame.
pub struct LiveFeed {
    source_name: String,
    buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    /// Set by the reader when the source refuses to open.
    open_error: Arc<Mutex<Option<CaptureError>>>,
    /// Signals both threads to exit during teardown.
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Spawn the reader and watchdog threads for `source`.
    ///
    /// If `on_error` is provided, it is called with `(source_name, error_msg)`
    /// when the source fails to open or goes silent.
    pub fn start(
        source: Box<dyn VideoSource>,
        fps: f32,
        on_error: Option<ErrorCallback>,
    ) -> Result<Self> {
        let source_name = source.name().to_string();
        let buffer = Arc::new(FrameBuffer::new(3));
        let running = Arc::new(AtomicBool::new(false));
        let open_error = Arc::new(Mutex::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));
        let interval = Duration::from_secs_f32(1.0 / fps.clamp(MIN_FPS, MAX_FPS));

        let on_error_wd = on_error.clone();

        let thread = {
            let buffer = Arc::clone(&buffer);
            let running = Arc::clone(&running);
            let open_error = Arc::clone(&open_error);
            let shutdown = Arc::clone(&shutdown);
            std::thread::Builder::new()
                .name("video-feed".to_string())
                .spawn(move || {
                    Self::run_reader(
                        source,
                        &buffer,
                        &running,
                        &open_error,
                        &shutdown,
                        interval,
                        on_error,
                    )
                })
                .map_err(|e| CaptureError::SourceOpen(format!("failed to spawn reader: {e}")))?
        };

        let watchdog = {
            let name = source_name.clone();
            let buffer = Arc::clone(&buffer);
            let running = Arc::clone(&running);
            let shutdown = Arc::clone(&shutdown);
            std::thread::Builder::new()
                .name("feed-watchdog".to_string())
                .spawn(move || {
                    Self::run_watchdog_with_config(
                        &name,
                        &buffer,
                        &running,
                        &shutdown,
                        on_error_wd.as_ref(),
                        WatchdogConfig::default(),
                    )
                })
                .map_err(|e| CaptureError::SourceOpen(format!("failed to spawn watchdog: {e}")))?
        };

        Ok(Self {
            source_name,
            buffer,
            running,
            open_error,
            shutdown,
            thread: Some(thread),
            watchdog: Some(watchdog),
        })
    }

    /// Get a reference to the frame buffer.
    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }

    /// Whether the source is open and delivering frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Wait for the reader to open the source.
    ///
    /// Returns the source's own error if it refused to open, or
    /// `SourceOpen` if it is still not open after `timeout`.
    pub async fn wait_until_open(&self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_running() {
                return Ok(());
            }
            let open_error = self.open_error.lock().take();
            if let Some(e) = open_error {
                return Err(e);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CaptureError::SourceOpen(format!(
                    "'{}' did not open within {}ms",
                    self.source_name,
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(OPEN_POLL_INTERVAL).await;
        }
    }

    /// Reader loop: open the source, then poll it until shutdown or until
    /// the watchdog clears `running`.
    fn run_reader(
        mut source: Box<dyn VideoSource>,
        buffer: &FrameBuffer,
        running: &AtomicBool,
        open_error: &Mutex<Option<CaptureError>>,
        shutdown: &AtomicBool,
        interval: Duration,
        on_error: Option<ErrorCallback>,
    ) {
        match source.open() {
            Ok(resolution) => {
                info!("video source '{}' open at {resolution}", source.name());
                running.store(true, Ordering::Relaxed);
            }
            Err(e) => {
                error!("video source '{}' failed to open: {e}", source.name());
                if let Some(cb) = &on_error {
                    cb(source.name(), &e.to_string());
                }
                *open_error.lock() = Some(e);
                return;
            }
        }

        let mut failures: u64 = 0;
        while !shutdown.load(Ordering::Relaxed) && running.load(Ordering::Relaxed) {
            match source.read_frame() {
                Ok(frame) => {
                    if failures > 0 {
                        info!("video source '{}' recovered after {failures} failed reads", source.name());
                    }
                    failures = 0;
                    buffer.push(frame);
                }
                Err(e) => {
                    failures += 1;
                    if failures == 1 {
                        warn!("video source '{}' read failed: {e}", source.name());
                    } else {
                        debug!("video source '{}' read failed ({failures}x): {e}", source.name());
                    }
                }
            }
            std::thread::sleep(interval);
        }

        running.store(false, Ordering::Relaxed);
        info!("video feed exiting for '{}'", source.name());
    }

    /// Watchdog: waits for the source to open, then checks that a frame
    /// arrives within `frame_timeout`. Fires `on_error` and stops the feed
    /// if the source stays silent.
    fn run_watchdog_with_config(
        source_name: &str,
        buffer: &FrameBuffer,
        running: &AtomicBool,
        shutdown: &AtomicBool,
        on_error: Option<&ErrorCallback>,
        config: WatchdogConfig,
    ) {
        let WatchdogConfig {
            startup_timeout,
            frame_timeout,
            poll_interval,
        } = config;

        let start = std::time::Instant::now();
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            if running.load(Ordering::Relaxed) {
                break;
            }
            if start.elapsed() >= startup_timeout {
                // Never opened; the reader reports its own error
                return;
            }
            std::thread::sleep(poll_interval);
        }

        let deadline = std::time::Instant::now() + frame_timeout;
        loop {
            if shutdown.load(Ordering::Relaxed) || !running.load(Ordering::Relaxed) {
                return;
            }
            if buffer.sequence() > 0 {
                return;
            }
            if std::time::Instant::now() >= deadline {
                warn!(
                    "watchdog: no frames received within {}ms from '{source_name}'",
                    frame_timeout.as_millis()
                );
                if let Some(cb) = on_error {
                    cb(
                        source_name,
                        &format!(
                            "Video source produces no frames ({}ms timeout)",
                            frame_timeout.as_millis()
                        ),
                    );
                }
                running.store(false, Ordering::Relaxed);
                return;
            }
            std::thread::sleep(poll_interval);
        }
    }

    /// Stop the feed. Idempotent.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.watchdog.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
