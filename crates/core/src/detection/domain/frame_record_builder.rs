use crate::detection::domain::detection::Detection;
use crate::detection::domain::frame_record::{BoxRecord, FrameRecord};

/// Converts detector output into the exported per-frame shape.
///
/// `x`/`y` are the top-left corner truncated toward zero. Width and height are
/// the float extent truncated toward zero, so `(20.2, 80.1)` gives `y = 20,
/// height = 59`. Degenerate boxes keep their negative extent; NaN truncates to 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameRecordBuilder;

impl FrameRecordBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, detections: &[Detection]) -> FrameRecord {
        detections
            .iter()
            .enumerate()
            .map(|(id, d)| {
                BoxRecord {
                    id,
                    x: truncate(d.x1),
                    y: truncate(d.y1),
                    width: truncate(d.x2 - d.x1),
                    height: truncate(d.y2 - d.y1),
                    label: d.label.clone(),
                    conf: d.confidence,
                }
            })
            .collect()
    }
}

fn truncate(v: f64) -> i32 {
    // `as` rounds toward zero, maps NaN to 0 and saturates at the i32 bounds.
    v as i32
}
