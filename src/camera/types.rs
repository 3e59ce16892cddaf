use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Fixed resolution of every still submitted for classification.
    pub const CAPTURE: Resolution = Resolution::new(640, 480);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size in bytes of a packed RGB24 buffer at this resolution.
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single raw frame delivered by a video source.
pub struct Frame {
    /// Packed RGB24 pixel data, row-major, no padding.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When the frame entered the process.
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap an RGB buffer, rejecting buffers whose length does not match
    /// the dimensions.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Option<Self> {
        if data.len() != Resolution::new(width, height).rgb_len() || width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            captured_at: Instant::now(),
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}
