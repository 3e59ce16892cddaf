pub mod camera;
pub mod classify;
pub mod cli;
pub mod console;
pub mod diagnostics;
pub mod notify;
pub mod pipeline;
pub mod preview;
pub mod settings;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use camera::dummy::TestPatternSource;
use camera::source::VideoSource;
use camera::still::StillFileSource;
use classify::client::{ClassificationClient, ClientOptions};
use cli::Cli;
use notify::dispatcher::ChannelDispatcher;
use pipeline::controller::CaptureController;
use preview::capture::{ErrorCallback, LiveFeed};
use preview::snapshot::FrameCapturer;
use settings::types::SourceSetting;

/// Errors that stop the monitor from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] settings::SettingsError),

    #[error("video source failed: {0}")]
    Capture(#[from] camera::error::CaptureError),

    #[error("classifier setup failed: {0}")]
    Classify(#[from] classify::error::ClassifyError),
}

/// Create the video source for the configured setting.
pub fn build_source(setting: &SourceSetting) -> Box<dyn VideoSource> {
    match setting {
        SourceSetting::TestPattern => Box::new(TestPatternSource::default()),
        SourceSetting::Still { path } => Box::new(StillFileSource::new(path.clone())),
    }
}

/// How long startup waits for the video source to open.
const SOURCE_OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the video feed and wait until its source is open, so a broken
/// source stops startup instead of failing every capture later.
pub async fn start_feed(
    setting: &SourceSetting,
    fps: f32,
    open_timeout: Duration,
) -> Result<LiveFeed, AppError> {
    let on_error: ErrorCallback = Arc::new(|source: &str, message: &str| {
        error!("video source '{source}': {message}");
    });
    let feed = LiveFeed::start(build_source(setting), fps, Some(on_error))?;
    feed.wait_until_open(open_timeout).await?;
    info!("video source '{}' started at {fps} fps", feed.source_name());
    Ok(feed)
}

/// Run the monitor until the operator quits.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = cli.resolve()?;
    info!("classification endpoint: {}", config.endpoint);

    let mut feed = start_feed(&config.source, config.fps, SOURCE_OPEN_TIMEOUT).await?;

    let client = ClassificationClient::new(
        config.endpoint.clone(),
        ClientOptions {
            timeout: config.request_timeout,
            threshold: config.threshold,
        },
    )?;

    let (dispatcher, notifications) = ChannelDispatcher::new();
    let renderer = tokio::spawn(notify::render::render_notifications(
        notifications,
        tokio::io::stdout(),
    ));

    let controller = Arc::new(CaptureController::new(
        FrameCapturer::new(Arc::clone(feed.buffer())),
        Arc::new(client),
        Arc::new(dispatcher),
    ));

    let snapshot_writer = config.snapshot_path.clone().map(|path| {
        info!("last captured image will be written to {}", path.display());
        tokio::spawn(preview::display::run_snapshot_writer(
            controller.subscribe_last_image(),
            path,
        ))
    });

    console::run_console(
        Arc::clone(&controller),
        console::spawn_stdin_reader(),
        config.capture_interval,
    )
    .await;

    if controller.is_busy() {
        info!("waiting for the in-flight capture to finish");
    }
    controller.wait_idle().await;

    let stats = controller.stats();
    info!(
        "{} cycles: {} drowsy, {} alert, {} failed, {} ignored",
        stats.cycles, stats.drowsy, stats.alert, stats.failures, stats.ignored_triggers
    );

    // Dropping the controller closes the notification channel and the
    // last-image watch, which ends the renderer and the snapshot writer.
    drop(controller);
    if let Some(writer) = snapshot_writer {
        if let Err(e) = writer.await {
            warn!("snapshot writer task failed: {e}");
        }
    }
    match renderer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("notification output failed: {e}"),
        Err(e) => warn!("notification renderer task failed: {e}"),
    }

    feed.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::error::CaptureError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn start_feed_fails_for_missing_still_file() {
        let dir = TempDir::new().unwrap();
        let setting = SourceSetting::Still {
            path: dir.path().join("missing.jpg"),
        };

        let result = start_feed(&setting, 15.0, Duration::from_secs(2)).await;
        assert!(matches!(
            result,
            Err(AppError::Capture(CaptureError::SourceOpen(_)))
        ));
    }

    #[tokio::test]
    async fn start_feed_runs_test_pattern() {
        let mut feed = start_feed(&SourceSetting::TestPattern, 30.0, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(feed.is_running());
        assert_eq!(feed.source_name(), "Dummy Test Pattern");
        feed.stop();
    }

    #[test]
    fn build_source_names_still_path() {
        let source = build_source(&SourceSetting::Still {
            path: "/tmp/cam.jpg".into(),
        });
        assert!(source.name().contains("/tmp/cam.jpg"));
    }
}
