use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

pub type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// Sequential access to the decoded frames of a video file.
///
/// `open` must succeed before `frames` yields anything useful. `close` may be
/// called any number of times, including on a reader that was never opened.
pub trait VideoReader: Send {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in decode order with zero-based, gap-free indices.
    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_>;

    fn close(&mut self);
}
