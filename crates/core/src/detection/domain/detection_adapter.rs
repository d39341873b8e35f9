use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector::Detector;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("detector failed to initialize: {0}")]
    Init(#[source] Box<dyn std::error::Error>),
    #[error("detection failed on frame {frame}: {source}")]
    Frame {
        frame: usize,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Runs exactly one inference call per frame on a [`Detector`].
///
/// Construction warms the detector up, so an unusable model is reported
/// before the pipeline touches the video.
pub struct DetectionAdapter {
    detector: Box<dyn Detector>,
}

impl DetectionAdapter {
    pub fn new(mut detector: Box<dyn Detector>) -> Result<Self, DetectionError> {
        detector.warmup().map_err(DetectionError::Init)?;
        Ok(Self { detector })
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        self.detector
            .detect(frame)
            .map_err(|source| DetectionError::Frame {
                frame: frame.index(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedDetector {
        warmup_fails: bool,
        fail_on: Option<usize>,
        calls: usize,
    }

    impl Detector for ScriptedDetector {
        fn warmup(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            if self.warmup_fails {
                return Err("model unavailable".into());
            }
            Ok(())
        }

        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            self.calls += 1;
            if self.fail_on == Some(frame.index()) {
                return Err("inference crashed".into());
            }
            Ok(Vec::new())
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0; 12], 2, 2, index)
    }

    #[test]
    fn test_warmup_failure_is_init_error() {
        let result = DetectionAdapter::new(Box::new(ScriptedDetector {
            warmup_fails: true,
            fail_on: None,
            calls: 0,
        }));
        let err = result.err().unwrap();
        assert!(matches!(err, DetectionError::Init(_)));
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn test_no_detections_is_empty_vec() {
        let mut adapter = DetectionAdapter::new(Box::new(ScriptedDetector {
            warmup_fails: false,
            fail_on: None,
            calls: 0,
        }))
        .unwrap();
        assert!(adapter.detect(&frame(0)).unwrap().is_empty());
    }

    #[test]
    fn test_frame_failure_carries_frame_index() {
        let mut adapter = DetectionAdapter::new(Box::new(ScriptedDetector {
            warmup_fails: false,
            fail_on: Some(3),
            calls: 0,
        }))
        .unwrap();
        assert!(adapter.detect(&frame(2)).is_ok());
        match adapter.detect(&frame(3)) {
            Err(DetectionError::Frame { frame, .. }) => assert_eq!(frame, 3),
            other => panic!("expected frame error, got {other:?}"),
        }
    }
}
