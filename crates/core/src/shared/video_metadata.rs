use std::path::PathBuf;

/// Stream properties reported by a reader when a video is opened.
///
/// `total_frames` comes from the container and may be 0 when unknown; the
/// pipeline never relies on it for correctness, only for progress output.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}
