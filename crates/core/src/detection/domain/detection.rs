/// One object found in one frame, as reported by a detector.
///
/// Corners are in source-frame pixels and are not clamped or validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub label: String,
    pub confidence: f64,
    /// Set by a tracking detector; never part of the exported record.
    pub track_id: Option<u32>,
}

impl Detection {
    pub fn new(bbox: [f64; 4], label: impl Into<String>, confidence: f64) -> Self {
        Self {
            x1: bbox[0],
            y1: bbox[1],
            x2: bbox[2],
            y2: bbox[3],
            label: label.into(),
            confidence,
            track_id: None,
        }
    }

    pub fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}
