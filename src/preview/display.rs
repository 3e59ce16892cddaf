use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::encode::ImageEncoder;
use super::snapshot::ImageFrame;

/// Write `frame` to `path` atomically (write .tmp then rename), replacing
/// whatever image was there before.
pub async fn write_snapshot(path: &Path, frame: &ImageFrame) -> std::io::Result<()> {
    let payload = ImageEncoder::new()
        .encode(frame)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension("jpg.tmp");
    tokio::fs::write(&tmp_path, &payload.bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Mirror the controller's last captured image into a file until the
/// controller goes away.
pub async fn run_snapshot_writer(
    mut images: watch::Receiver<Option<Arc<ImageFrame>>>,
    path: PathBuf,
) {
    while images.changed().await.is_ok() {
        let Some(frame) = images.borrow_and_update().clone() else {
            continue;
        };
        match write_snapshot(&path, &frame).await {
            Ok(()) => debug!("snapshot {} written to {}", frame.sequence(), path.display()),
            Err(e) => warn!("failed to write snapshot to {}: {e}", path.display()),
        }
    }
}
