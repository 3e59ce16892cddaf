use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use crate::camera::error::{CaptureError, Result};
use crate::camera::source::VideoSource;
use crate::camera::types::{Frame, Resolution};

/// Decoded copy of the file, keyed by its modification time.
struct Cached {
    modified: SystemTime,
    data: Vec<u8>,
    resolution: Resolution,
    loaded_at: Instant,
}

/// Video source backed by an image file that an external grabber keeps
/// overwriting, e.g. `ffmpeg -f v4l2 -i /dev/video0 -update 1 frame.jpg`.
///
/// The file is re-decoded only when its modification time changes; in
/// between, reads return the cached pixels with the original load time so
/// staleness checks still see how old the image really is.
pub struct StillFileSource {
    path: PathBuf,
    name: String,
    cached: Option<Cached>,
}

impl StillFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("still file {}", path.display());
        Self {
            path,
            name,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(&self) -> Result<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| CaptureError::SourceRead(format!("{}: {e}", self.path.display())))
    }

    fn reload_if_changed(&mut self) -> Result<&Cached> {
        let modified = self.modified()?;
        let stale = !matches!(&self.cached, Some(cached) if cached.modified == modified);

        if stale {
            let img = image::open(&self.path)
                .map_err(|e| CaptureError::Decode(format!("{}: {e}", self.path.display())))?
                .to_rgb8();
            let resolution = Resolution::new(img.width(), img.height());
            tracing::debug!("reloaded {} ({resolution})", self.path.display());
            self.cached = Some(Cached {
                modified,
                data: img.into_raw(),
                resolution,
                loaded_at: Instant::now(),
            });
        }

        self.cached
            .as_ref()
            .ok_or_else(|| CaptureError::SourceRead("no cached frame".to_string()))
    }
}

impl VideoSource for StillFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<Resolution> {
        self.reload_if_changed()
            .map(|cached| cached.resolution)
            .map_err(|e| CaptureError::SourceOpen(e.to_string()))
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let cached = self.reload_if_changed()?;
        let mut frame = Frame::from_rgb(
            cached.data.clone(),
            cached.resolution.width,
            cached.resolution.height,
        )
        .ok_or_else(|| CaptureError::SourceRead("decoded buffer size mismatch".to_string()))?;
        frame.captured_at = cached.loaded_at;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32, value: u8) {
        let img: ImageBuffer<Rgb<u8>, _> =
            ImageBuffer::from_pixel(width, height, Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    #[test]
    fn open_reports_file_resolution() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&path, 8, 6, 10);

        let mut source = StillFileSource::new(&path);
        assert_eq!(source.open().unwrap(), Resolution::new(8, 6));
    }

    #[test]
    fn open_fails_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut source = StillFileSource::new(dir.path().join("missing.jpg"));
        assert!(matches!(source.open(), Err(CaptureError::SourceOpen(_))));
    }

    #[test]
    fn read_frame_returns_decoded_pixels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&path, 4, 4, 200);

        let mut source = StillFileSource::new(&path);
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.data.len(), 4 * 4 * 3);
        assert!(frame.data.iter().all(|&b| b == 200));
    }

    #[test]
    fn read_frame_fails_for_garbage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let mut source = StillFileSource::new(&path);
        assert!(matches!(source.read_frame(), Err(CaptureError::Decode(_))));
    }

    #[test]
    fn unchanged_file_keeps_original_load_time() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&path, 2, 2, 1);

        let mut source = StillFileSource::new(&path);
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();
        assert_eq!(first.captured_at, second.captured_at);
    }

    #[test]
    fn name_mentions_path() {
        let source = StillFileSource::new("/tmp/cam.jpg");
        assert!(source.name().contains("/tmp/cam.jpg"));
        assert_eq!(source.path(), Path::new("/tmp/cam.jpg"));
    }
}
