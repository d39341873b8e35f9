//! YOLO object detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, and class-aware NMS for
//! Ultralytics-style detection heads (YOLOv8 / YOLO11: `[1, 4 + classes, N]`).
use std::path::Path;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector::Detector;
use crate::shared::frame::Frame;

use super::class_names::ClassNames;
use super::execution_provider::preferred_execution_providers;
use super::math::bbox_iou;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for detections.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.7;

/// Upper bound on detections kept per frame after NMS.
const MAX_DETECTIONS: usize = 300;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    class_names: ClassNames,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable. Class names come
    /// from the model's `names` metadata, else COCO.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let class_names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names"))
            .and_then(|raw| ClassNames::from_metadata(&raw))
            .unwrap_or_else(|| {
                log::debug!("Model has no class names metadata, using COCO labels");
                ClassNames::coco()
            });

        log::info!(
            "Loaded {} (input {input_size}x{input_size}, {} classes)",
            model_path.display(),
            class_names.len()
        );

        Ok(Self {
            session,
            class_names,
            confidence,
            input_size,
        })
    }

    /// Runs the session and returns the first output as `(shape, data)`.
    fn infer(
        &mut self,
        input: ndarray::Array4<f32>,
    ) -> Result<Option<(Vec<usize>, Vec<f32>)>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Ok(None);
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or("Cannot get tensor slice")?
            .to_vec();
        Ok(Some((shape, data)))
    }
}

impl Detector for OnnxYoloDetector {
    fn warmup(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let size = self.input_size as usize;
        let blank = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
        self.infer(blank)?;
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        // 1. Preprocess: letterbox + normalize → NCHW float32
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        // 2. Inference
        let Some((shape, data)) = self.infer(input_tensor)? else {
            log::debug!("Frame {}: model produced no outputs", frame.index());
            return Ok(Vec::new());
        };
        let layout = OutputLayout::from_shape(&shape)?;

        // 3. Decode + NMS
        let mut candidates = decode(&data, &layout, self.confidence, &letterbox);
        let kept = nms(&mut candidates, NMS_IOU_THRESH, MAX_DETECTIONS);

        Ok(kept
            .into_iter()
            .map(|c| Detection::new(c.bbox, self.class_names.label(c.class_id), c.confidence))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Mapping from letterboxed model coordinates back to the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
    frame_width: u32,
    frame_height: u32,
}

impl Letterbox {
    /// Maps a model-space box to frame pixels, clipped to the frame.
    fn to_frame(&self, bbox: [f64; 4]) -> [f64; 4] {
        let w = self.frame_width as f64;
        let h = self.frame_height as f64;
        let map_x = |v: f64| ((v - self.pad_x as f64) / self.scale).clamp(0.0, w);
        let map_y = |v: f64| ((v - self.pad_y as f64) / self.scale).clamp(0.0, h);
        [map_x(bbox[0]), map_y(bbox[1]), map_x(bbox[2]), map_y(bbox[3])]
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
            frame_width: frame.width(),
            frame_height: frame.height(),
        },
    )
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

/// Shape of the detection head output.
///
/// Ultralytics exports `[1, 4 + classes, N]` (features first); some converters
/// emit `[1, N, 4 + classes]`. Features are always fewer than anchors.
#[derive(Clone, Copy, Debug, PartialEq)]
struct OutputLayout {
    num_dets: usize,
    num_feats: usize,
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(shape: &[usize]) -> Result<Self, Box<dyn std::error::Error>> {
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        if shape[1] == 0 || shape[2] == 0 {
            return Ok(Self {
                num_dets: 0,
                num_feats: 0,
                transposed: false,
            });
        }
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats <= 4 {
            return Err(format!("YOLO output has no class scores: {shape:?}").into());
        }
        Ok(Self {
            num_dets,
            num_feats,
            transposed,
        })
    }

    fn value(&self, data: &[f32], det: usize, feat: usize) -> f32 {
        if self.transposed {
            data[feat * self.num_dets + det]
        } else {
            data[det * self.num_feats + feat]
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    bbox: [f64; 4],
    class_id: usize,
    confidence: f64,
}

/// Row format: `[cx, cy, w, h, score_0, ..., score_n]`; best class wins.
fn decode(
    data: &[f32],
    layout: &OutputLayout,
    confidence: f64,
    letterbox: &Letterbox,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for i in 0..layout.num_dets {
        let mut class_id = 0;
        let mut best = f32::MIN;
        for f in 4..layout.num_feats {
            let score = layout.value(data, i, f);
            if score > best {
                best = score;
                class_id = f - 4;
            }
        }
        let conf = best as f64;
        if conf < confidence {
            continue;
        }

        let cx = layout.value(data, i, 0) as f64;
        let cy = layout.value(data, i, 1) as f64;
        let w = layout.value(data, i, 2) as f64;
        let h = layout.value(data, i, 3) as f64;

        candidates.push(Candidate {
            bbox: letterbox.to_frame([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]),
            class_id,
            confidence: conf,
        });
    }
    candidates
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy class-aware NMS: sort by confidence descending, suppress
/// overlapping boxes of the same class, keep at most `max_det`.
fn nms(dets: &mut [Candidate], iou_thresh: f64, max_det: usize) -> Vec<Candidate> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        if keep.len() == max_det {
            break;
        }
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if bbox_iou(&dets[i].bbox, &dets[j].bbox) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
