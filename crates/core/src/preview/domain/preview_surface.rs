use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// What the user asked for after a preview frame was shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewSignal {
    Continue,
    Cancel,
}

/// Displays annotated frames while the pipeline runs.
///
/// `show` must leave `frame` untouched: annotations are drawn on a copy.
/// The returned signal is the only cancellation channel the pipeline polls.
pub trait PreviewSurface: Send {
    fn show(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
    ) -> Result<PreviewSignal, Box<dyn std::error::Error>>;

    /// Releases the surface. Safe to call more than once.
    fn close(&mut self);
}
