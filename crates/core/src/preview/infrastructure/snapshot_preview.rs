use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, TryRecvError};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::domain::detection::Detection;
use crate::preview::domain::preview_surface::{PreviewSignal, PreviewSurface};
use crate::shared::frame::Frame;

const BORDER: u32 = 2;

/// Box colour when a detection carries no track id.
const UNTRACKED: Rgb<u8> = Rgb([0, 255, 0]);

const TRACK_PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 56, 56]),
    Rgb([255, 157, 151]),
    Rgb([255, 112, 31]),
    Rgb([255, 178, 29]),
    Rgb([207, 210, 49]),
    Rgb([72, 249, 10]),
    Rgb([26, 147, 52]),
    Rgb([0, 194, 255]),
];

/// Preview that overwrites a JPEG with the latest annotated frame.
///
/// A message on the cancel channel stops the run at the next poll. A
/// disconnected channel means nobody can cancel any more and is ignored.
pub struct SnapshotPreview {
    path: PathBuf,
    cancel: Option<Receiver<()>>,
    closed: bool,
}

impl SnapshotPreview {
    pub fn new(path: impl Into<PathBuf>, cancel: Option<Receiver<()>>) -> Self {
        Self {
            path: path.into(),
            cancel,
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn poll_cancel(&self) -> PreviewSignal {
        let Some(rx) = &self.cancel else {
            return PreviewSignal::Continue;
        };
        match rx.try_recv() {
            Ok(()) => PreviewSignal::Cancel,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => PreviewSignal::Continue,
        }
    }
}

impl PreviewSurface for SnapshotPreview {
    fn show(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
    ) -> Result<PreviewSignal, Box<dyn std::error::Error>> {
        if self.closed {
            return Err("SnapshotPreview: surface already closed".into());
        }

        let mut img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;
        for det in detections {
            draw_box(&mut img, det, colour_for(det.track_id));
        }
        img.save_with_format(&self.path, ImageFormat::Jpeg)?;

        Ok(self.poll_cancel())
    }

    fn close(&mut self) {
        if !self.closed {
            log::debug!("Preview closed, last frame at {}", self.path.display());
        }
        self.closed = true;
        self.cancel = None;
    }
}

fn colour_for(track_id: Option<u32>) -> Rgb<u8> {
    match track_id {
        Some(id) => TRACK_PALETTE[id as usize % TRACK_PALETTE.len()],
        None => UNTRACKED,
    }
}

/// Draws a `BORDER`-pixel hollow rectangle; `imageproc` clips it to the
/// image. Non-finite or fully off-image boxes draw nothing.
fn draw_box(img: &mut RgbImage, det: &Detection, colour: Rgb<u8>) {
    let (w, h) = img.dimensions();
    if det.bbox().iter().any(|v| !v.is_finite()) {
        return;
    }

    let (left, right) = (det.x1.min(det.x2), det.x1.max(det.x2));
    let (top, bottom) = (det.y1.min(det.y2), det.y1.max(det.y2));
    if right < 0.0 || bottom < 0.0 || left >= w as f64 || top >= h as f64 {
        return;
    }

    // Edges beyond the image are pulled in just past the border so they stay hidden.
    let x = left.max(-1.0) as i32;
    let y = top.max(-1.0) as i32;
    let width = (right.min(w as f64) as i32 - x + 1) as u32;
    let height = (bottom.min(h as f64) as i32 - y + 1) as u32;
    for inset in 0..BORDER {
        if width <= 2 * inset || height <= 2 * inset {
            break;
        }
        let rect = Rect::at(x + inset as i32, y + inset as i32)
            .of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(img, rect, colour);
    }
}
