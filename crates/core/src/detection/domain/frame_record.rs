use serde::{Deserialize, Serialize};

/// One exported detection. Field order is the JSON field order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Position within its frame, not an identity across frames.
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub label: String,
    pub conf: f64,
}

/// Detections of one frame, in detector order.
pub type FrameRecord = Vec<BoxRecord>;

/// One [`FrameRecord`] per decoded frame; index is the frame number.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoResult {
    frames: Vec<FrameRecord>,
}

impl VideoResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FrameRecord) {
        self.frames.push(record);
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn total_boxes(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }
}

impl From<Vec<FrameRecord>> for VideoResult {
    fn from(frames: Vec<FrameRecord>) -> Self {
        Self { frames }
    }
}
