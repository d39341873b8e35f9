use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for object detection.
///
/// Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`.
pub trait Detector: Send {
    /// Prepares the backend before the first frame. Errors here are setup
    /// failures and abort the run before any frame is read.
    fn warmup(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    /// Returns detections in the backend's order. An empty result is `Ok(vec![])`.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
