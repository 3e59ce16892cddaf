use base64::Engine;

use super::snapshot::ImageFrame;
use crate::camera::error::{CaptureError, Result};

/// MIME type of every submitted payload.
pub const PAYLOAD_MIME: &str = "image/jpeg";

/// Synthetic filename attached to every submitted payload.
pub const PAYLOAD_FILENAME: &str = "capture.jpg";

/// Raw image bytes ready for upload, plus their declared type and filename.
///
/// Created once per capture and consumed by the submission step.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: &'static str,
}

impl BinaryPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for BinaryPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryPayload")
            .field("mime", &self.mime)
            .field("filename", &self.filename)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Turns a captured data-URI still into an upload payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, frame: &ImageFrame) -> Result<BinaryPayload> {
        let uri = frame.data_uri();
        let (header, body) = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| CaptureError::Decode("not a data URI".to_string()))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default();
        if mime != PAYLOAD_MIME {
            return Err(CaptureError::Decode(format!("unexpected media type '{mime}'")));
        }
        if !params.any(|p| p == "base64") {
            return Err(CaptureError::Decode("data URI is not base64 encoded".to_string()));
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CaptureError::Decode("empty image payload".to_string()));
        }

        Ok(BinaryPayload {
            bytes,
            mime: PAYLOAD_MIME,
            filename: PAYLOAD_FILENAME,
        })
    }
}
