use crate::camera::error::Result;
use crate::camera::types::{Frame, Resolution};

/// A producer of live RGB frames.
///
/// Implementations are driven from the feed thread: `open` once, then
/// `read_frame` at the feed's frame rate. A source that has nothing new to
/// deliver may return the previous frame again.
pub trait VideoSource: Send {
    /// Human-readable description for logs.
    fn name(&self) -> &str;

    /// Prepare the source and report its native resolution.
    fn open(&mut self) -> Result<Resolution>;

    /// Read the current frame.
    fn read_frame(&mut self) -> Result<Frame>;
}
