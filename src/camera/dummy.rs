use crate::camera::error::{CaptureError, Result};
use crate::camera::source::VideoSource;
use crate::camera::types::{Frame, Resolution};

const DUMMY_SOURCE_NAME: &str = "Dummy Test Pattern";

/// Width of the vertical bar that sweeps across the pattern, in pixels.
const BAR_WIDTH: u32 = 16;

/// A fake video source for running without real hardware.
///
/// Produces a red/green gradient with a white bar that moves a few pixels
/// on every read, so consecutive frames differ.
///
/// Enable via `DUMMY_CAMERA=1` environment variable or `--source test-pattern`.
pub struct TestPatternSource {
    resolution: Resolution,
    tick: u32,
}

impl TestPatternSource {
    /// Create a pattern source at the given resolution.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            tick: 0,
        }
    }

    /// Whether the dummy camera is enabled via environment variable.
    pub fn is_enabled() -> bool {
        std::env::var("DUMMY_CAMERA").is_ok_and(|v| v == "1" || v == "true")
    }

    /// Render the pattern for a given tick.
    pub fn pattern(resolution: Resolution, tick: u32) -> Vec<u8> {
        let Resolution { width, height } = resolution;
        let bar_x = tick.wrapping_mul(4) % width.max(1);
        let mut data = Vec::with_capacity(resolution.rgb_len());
        for y in 0..height {
            for x in 0..width {
                if x >= bar_x && x < bar_x + BAR_WIDTH {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    data.push((x * 255 / width.max(1)) as u8);
                    data.push((y * 255 / height.max(1)) as u8);
                    data.push(128);
                }
            }
        }
        data
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new(Resolution::CAPTURE)
    }
}

impl VideoSource for TestPatternSource {
    fn name(&self) -> &str {
        DUMMY_SOURCE_NAME
    }

    fn open(&mut self) -> Result<Resolution> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(CaptureError::SourceOpen(format!(
                "invalid pattern resolution {}",
                self.resolution
            )));
        }
        Ok(self.resolution)
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let data = Self::pattern(self.resolution, self.tick);
        self.tick = self.tick.wrapping_add(1);
        Frame::from_rgb(data, self.resolution.width, self.resolution.height)
            .ok_or_else(|| CaptureError::SourceRead("pattern buffer size mismatch".to_string()))
    }
}
