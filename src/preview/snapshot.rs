use std::sync::Arc;
use std::time::{Duration, SystemTime};

use base64::Engine;

use super::capture::FrameBuffer;
use super::compress;
use crate::camera::error::{CaptureError, Result};
use crate::camera::types::Resolution;

/// Prefix of every data URI produced by [`FrameCapturer`].
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Frames older than this are treated as "no frame available".
const DEFAULT_MAX_FRAME_AGE: Duration = Duration::from_secs(5);

/// A captured still, encoded as a self-contained JPEG data URI.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFrame {
    data_uri: String,
    resolution: Resolution,
    captured_at: SystemTime,
    /// Feed sequence number of the frame this still was taken from.
    sequence: u64,
}

impl ImageFrame {
    /// Build a frame from an existing data URI (e.g. one received from
    /// another component). No validation happens until it is encoded.
    pub fn from_data_uri(data_uri: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            data_uri: data_uri.into(),
            resolution,
            captured_at: SystemTime::now(),
            sequence: 0,
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for ImageFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFrame")
            .field("resolution", &self.resolution)
            .field("sequence", &self.sequence)
            .field("uri_len", &self.data_uri.len())
            .finish()
    }
}

/// Takes a still from the live feed on demand.
///
/// Reads the newest frame in the shared buffer without consuming it, scales
/// it to the capture resolution, mirrors it and encodes it as JPEG.
pub struct FrameCapturer {
    buffer: Arc<FrameBuffer>,
    target: Resolution,
    mirrored: bool,
    max_age: Duration,
}

impl FrameCapturer {
    pub fn new(buffer: Arc<FrameBuffer>) -> Self {
        Self {
            buffer,
            target: Resolution::CAPTURE,
            mirrored: true,
            max_age: DEFAULT_MAX_FRAME_AGE,
        }
    }

    /// Override the staleness limit.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn capture(&self) -> Result<ImageFrame> {
        let sequence = self.buffer.sequence();
        let frame = self.buffer.latest().ok_or(CaptureError::NoFrame)?;

        let age = frame.captured_at.elapsed();
        if age > self.max_age {
            return Err(CaptureError::StaleFrame {
                age_ms: age.as_millis(),
            });
        }

        let mut rgb = compress::resize_rgb(&frame.data, frame.resolution(), self.target)?;
        if self.mirrored {
            rgb = compress::mirror_rgb(rgb, self.target)?;
        }
        let jpeg = compress::compress_jpeg(rgb, self.target, compress::CAPTURE_QUALITY)?;

        let mut data_uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
        data_uri.push_str(JPEG_DATA_URI_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(&jpeg, &mut data_uri);

        Ok(ImageFrame {
            data_uri,
            resolution: self.target,
            captured_at: SystemTime::now(),
            sequence,
        })
    }
}
