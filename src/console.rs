use serde_json::json;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::pipeline::controller::CaptureController;

/// One operator command read from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capture,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Empty line or `c` captures, `s` prints status, `h`/`?` prints help,
    /// `q` quits.
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "c" | "capture" => Self::Capture,
            "s" | "status" => Self::Status,
            "h" | "?" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "commands: <enter>/c capture, s status, h help, q quit";

/// Read stdin lines on a dedicated thread.
///
/// A thread blocked in `read_line` never holds up process exit, unlike a
/// read on the async runtime.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("failed to spawn stdin reader, console input disabled: {e}");
    }
    rx
}

/// Status report as a single JSON line.
pub fn status_line(controller: &CaptureController) -> String {
    let last_image = controller.last_image().map(|frame| {
        json!({
            "sequence": frame.sequence(),
            "resolution": frame.resolution().to_string(),
        })
    });
    json!({
        "state": controller.state(),
        "lastImage": last_image,
        "stats": controller.stats(),
    })
    .to_string()
}

fn trigger(controller: &Arc<CaptureController>, origin: &str) {
    if controller.trigger().is_some() {
        debug!("{origin} capture started");
    } else {
        info!("{origin} capture ignored: previous image still processing");
    }
}

/// Drive the controller from operator input and the optional timer until
/// the operator quits, input ends, or Ctrl-C arrives.
pub async fn run_console(
    controller: Arc<CaptureController>,
    mut input: mpsc::Receiver<String>,
    interval: Option<Duration>,
) {
    let mut ticker = interval.map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    println!("{HELP}");
    if let Some(period) = interval {
        info!("automatic capture every {}s", period.as_secs());
    }

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    debug!("console input closed");
                    break;
                };
                match Command::parse(&line) {
                    Command::Capture => trigger(&controller, "manual"),
                    Command::Status => println!("{}", status_line(&controller)),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Unknown(other) => println!("unknown command '{other}'; {HELP}"),
                }
            }
            _ = async {
                match ticker.as_mut() {
                    Some(ticker) => { ticker.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => trigger(&controller, "scheduled"),
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::error::Result;
    use crate::classify::types::ClassificationResult;
    use crate::classify::Classifier;
    use crate::camera::dummy::TestPatternSource;
    use crate::camera::types::{Frame, Resolution};
    use crate::notify::dispatcher::ChannelDispatcher;
    use crate::preview::capture::FrameBuffer;
    use crate::preview::encode::BinaryPayload;
    use crate::preview::snapshot::FrameCapturer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClassifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for CountingClassifier {
        async fn classify(&self, _payload: BinaryPayload) -> Result<ClassificationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ClassificationResult::new("Alert", 0.9)
        }
    }

    fn controller(classifier: Arc<CountingClassifier>) -> Arc<CaptureController> {
        let buffer = Arc::new(FrameBuffer::new(3));
        let res = Resolution::new(32, 24);
        buffer.push(Frame::from_rgb(TestPatternSource::pattern(res, 0), res.width, res.height).unwrap());
        let (dispatcher, _rx) = ChannelDispatcher::new();
        Arc::new(CaptureController::new(
            FrameCapturer::new(buffer),
            classifier,
            Arc::new(dispatcher),
        ))
    }

    #[test]
    fn parse_recognises_commands() {
        assert_eq!(Command::parse(""), Command::Capture);
        assert_eq!(Command::parse(" C \n"), Command::Capture);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("?"), Command::Help);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("zap"), Command::Unknown("zap".to_string()));
    }

    #[tokio::test]
    async fn console_triggers_capture_and_quits() {
        let classifier = Arc::new(CountingClassifier::default());
        let controller = controller(Arc::clone(&classifier));
        let (tx, rx) = mpsc::channel(8);
        tx.send("c".to_string()).await.unwrap();
        tx.send("q".to_string()).await.unwrap();

        run_console(Arc::clone(&controller), rx, None).await;
        controller.wait_idle().await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.stats().alert, 1);
    }

    #[tokio::test]
    async fn console_exits_when_input_closes() {
        let classifier = Arc::new(CountingClassifier::default());
        let controller = controller(Arc::clone(&classifier));
        let (tx, rx) = mpsc::channel(8);
        drop(tx);

        run_console(controller, rx, None).await;
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_triggers_captures() {
        let classifier = Arc::new(CountingClassifier::default());
        let controller = controller(Arc::clone(&classifier));
        let (tx, rx) = mpsc::channel(8);

        let console = tokio::spawn(run_console(
            Arc::clone(&controller),
            rx,
            Some(Duration::from_secs(10)),
        ));
        tokio::time::sleep(Duration::from_secs(25)).await;
        tx.send("q".to_string()).await.unwrap();
        console.await.unwrap();
        controller.wait_idle().await;

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_line_reports_state_and_stats() {
        let classifier = Arc::new(CountingClassifier::default());
        let controller = controller(classifier);
        controller.run_cycle().await;

        let status: serde_json::Value = serde_json::from_str(&status_line(&controller)).unwrap();
        assert_eq!(status["state"], "idle");
        assert_eq!(status["lastImage"]["sequence"], 1);
        assert_eq!(status["lastImage"]["resolution"], "640x480");
        assert_eq!(status["stats"]["alert"], 1);
    }
}
