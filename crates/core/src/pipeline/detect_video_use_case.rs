use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::detection_adapter::{DetectionAdapter, DetectionError};
use crate::detection::domain::frame_record::VideoResult;
use crate::detection::domain::frame_record_builder::FrameRecordBuilder;
use crate::preview::domain::preview_surface::{PreviewSignal, PreviewSurface};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to open video {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// How the frame loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    EndOfStream,
    Cancelled,
}

#[derive(Debug)]
pub struct RunReport {
    pub result: VideoResult,
    pub completion: Completion,
    pub metadata: VideoMetadata,
}

/// Runs detection over every frame of one video.
///
/// Each decoded frame goes through the [`DetectionAdapter`], is turned into a
/// frame record and appended to the result. With a preview attached, the
/// annotated frame is shown after it was recorded and the preview may cancel
/// the run; the frames recorded so far are returned as a normal result.
///
/// Single-use: `execute` consumes the use case. The reader and preview are
/// closed on every exit path, including errors and panics.
pub struct DetectVideoUseCase {
    reader: Box<dyn VideoReader>,
    detector: DetectionAdapter,
    builder: FrameRecordBuilder,
    preview: Option<Box<dyn PreviewSurface>>,
    logger: Box<dyn PipelineLogger>,
}

impl DetectVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: DetectionAdapter,
        preview: Option<Box<dyn PreviewSurface>>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            detector,
            builder: FrameRecordBuilder::new(),
            preview,
            logger,
        }
    }

    pub fn execute(self, input: &Path) -> Result<RunReport, PipelineError> {
        let Self {
            reader,
            mut detector,
            builder,
            preview,
            mut logger,
        } = self;
        let mut resources = Resources { reader, preview };

        let metadata = resources
            .reader
            .open(input)
            .map_err(|source| PipelineError::Open {
                path: input.to_path_buf(),
                source,
            })?;
        logger.info(&format!(
            "Processing {} ({}x{}, {:.2} fps, {} frames)",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        ));

        let mut result = VideoResult::new();
        let mut completion = Completion::EndOfStream;
        let preview = &mut resources.preview;

        for next in resources.reader.frames() {
            let frame = match next {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!(
                        "Decode error after {} frames, treating as end of stream: {e}",
                        result.len()
                    );
                    break;
                }
            };

            let started = Instant::now();
            let detections = detector.detect(&frame)?;
            logger.timing("detect", elapsed_ms(started));
            logger.metric("detections", detections.len() as f64);

            result.push(builder.build(&detections));
            logger.progress(result.len(), metadata.total_frames);

            let Some(surface) = preview.as_mut() else {
                continue;
            };
            let started = Instant::now();
            let signal = surface.show(&frame, &detections);
            logger.timing("preview", elapsed_ms(started));
            match signal {
                Ok(PreviewSignal::Continue) => {}
                Ok(PreviewSignal::Cancel) => {
                    logger.info(&format!("Cancelled after {} frames", result.len()));
                    completion = Completion::Cancelled;
                    break;
                }
                Err(e) => {
                    log::warn!(
                        "Preview failed on frame {}, continuing without it: {e}",
                        frame.index()
                    );
                    surface.close();
                    *preview = None;
                }
            }
        }

        drop(resources);
        logger.summary();

        Ok(RunReport {
            result,
            completion,
            metadata,
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Closes the reader and preview when the run ends, however it ends.
struct Resources {
    reader: Box<dyn VideoReader>,
    preview: Option<Box<dyn PreviewSurface>>,
}

impl Drop for Resources {
    fn drop(&mut self) {
        self.reader.close();
        if let Some(preview) = self.preview.as_mut() {
            preview.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::Detection;
    use crate::detection::domain::detector::Detector;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        fail_open: bool,
        /// Yield a decode error once this many frames were produced.
        fail_after: Option<usize>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(count: usize) -> Self {
            Self {
                frames: (0..count)
                    .map(|i| Frame::new(vec![0; 4 * 4 * 3], 4, 4, i))
                    .collect(),
                fail_open: false,
                fail_after: None,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("moov atom not found".into());
            }
            Ok(VideoMetadata {
                width: 4,
                height: 4,
                fps: 25.0,
                total_frames: self.frames.len(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let fail_after = self.fail_after;
            Box::new(self.frames.drain(..).enumerate().map(
                move |(i, f)| -> Result<Frame, Box<dyn std::error::Error>> {
                    if fail_after == Some(i) {
                        Err("corrupt packet".into())
                    } else {
                        Ok(f)
                    }
                },
            ))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubDetector {
        results: HashMap<usize, Vec<Detection>>,
        fail_on: Option<usize>,
    }

    impl Detector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            if self.fail_on == Some(frame.index()) {
                return Err("inference crashed".into());
            }
            Ok(self
                .results
                .get(&frame.index())
                .cloned()
                .unwrap_or_default())
        }
    }

    struct StubPreview {
        cancel_on: Option<usize>,
        fail: bool,
        shown: Arc<Mutex<Vec<(usize, usize)>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubPreview {
        fn new(cancel_on: Option<usize>) -> Self {
            Self {
                cancel_on,
                fail: false,
                shown: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl PreviewSurface for StubPreview {
        fn show(
            &mut self,
            frame: &Frame,
            detections: &[Detection],
        ) -> Result<PreviewSignal, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("display gone".into());
            }
            self.shown
                .lock()
                .unwrap()
                .push((frame.index(), detections.len()));
            if self.cancel_on == Some(frame.index()) {
                Ok(PreviewSignal::Cancel)
            } else {
                Ok(PreviewSignal::Continue)
            }
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    #[derive(Clone, Default)]
    struct RecordingLogger {
        timings: Arc<Mutex<Vec<String>>>,
        metrics: Arc<Mutex<Vec<f64>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.timings.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, _name: &str, value: f64) {
            self.metrics.lock().unwrap().push(value);
        }
        fn info(&mut self, _message: &str) {}
    }

    fn det(x: f64, label: &str, conf: f64) -> Detection {
        Detection::new([x, 0.5, x + 10.9, 20.2], label, conf)
    }

    fn adapter(results: HashMap<usize, Vec<Detection>>) -> DetectionAdapter {
        DetectionAdapter::new(Box::new(StubDetector {
            results,
            fail_on: None,
        }))
        .unwrap()
    }

    fn scenario() -> HashMap<usize, Vec<Detection>> {
        HashMap::from([
            (0, vec![det(1.2, "person", 0.9), det(30.0, "car", 0.4)]),
            (2, vec![det(5.0, "dog", 0.7)]),
        ])
    }

    fn run(
        reader: StubReader,
        detector: DetectionAdapter,
        preview: Option<StubPreview>,
    ) -> Result<RunReport, PipelineError> {
        DetectVideoUseCase::new(
            Box::new(reader),
            detector,
            preview.map(|p| Box::new(p) as Box<dyn PreviewSurface>),
            Box::new(NullPipelineLogger),
        )
        .execute(Path::new("/videos/clip.mp4"))
    }

    // --- Tests ---

    #[test]
    fn test_three_frame_scenario() {
        let reader = StubReader::new(3);
        let closed = reader.closed.clone();

        let report = run(reader, adapter(scenario()), None).unwrap();

        assert_eq!(report.completion, Completion::EndOfStream);
        let frames = report.result.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames[0].iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(frames[0][0].label, "person");
        assert_eq!((frames[0][0].x, frames[0][0].width), (1, 10));
        assert_eq!(frames[0][1].label, "car");
        assert!(frames[1].is_empty());
        assert_eq!(frames[2][0].id, 0);
        assert_eq!(frames[2][0].label, "dog");
        assert_eq!(
            report.metadata.source_path,
            Some(PathBuf::from("/videos/clip.mp4"))
        );
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_all_empty_frames_are_kept() {
        let report = run(StubReader::new(4), adapter(HashMap::new()), None).unwrap();
        assert_eq!(report.result.len(), 4);
        assert_eq!(report.result.total_boxes(), 0);
    }

    #[test]
    fn test_cancel_after_second_frame_returns_partial_result() {
        let preview = StubPreview::new(Some(1));
        let shown = preview.shown.clone();
        let preview_closed = preview.closed.clone();
        let reader = StubReader::new(5);
        let reader_closed = reader.closed.clone();

        let report = run(reader, adapter(scenario()), Some(preview)).unwrap();

        assert_eq!(report.completion, Completion::Cancelled);
        assert_eq!(report.result.len(), 2);
        assert_eq!(*shown.lock().unwrap(), vec![(0, 2), (1, 0)]);
        assert!(*preview_closed.lock().unwrap());
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_detection_failure_aborts_and_releases_resources() {
        let reader = StubReader::new(5);
        let reader_closed = reader.closed.clone();
        let preview = StubPreview::new(None);
        let preview_closed = preview.closed.clone();
        let detector = DetectionAdapter::new(Box::new(StubDetector {
            results: HashMap::new(),
            fail_on: Some(2),
        }))
        .unwrap();

        let err = run(reader, detector, Some(preview)).unwrap_err();

        match err {
            PipelineError::Detection(DetectionError::Frame { frame, .. }) => assert_eq!(frame, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(*reader_closed.lock().unwrap());
        assert!(*preview_closed.lock().unwrap());
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let mut reader = StubReader::new(3);
        reader.fail_open = true;
        let reader_closed = reader.closed.clone();

        let err = run(reader, adapter(HashMap::new()), None).unwrap_err();

        assert!(matches!(err, PipelineError::Open { .. }));
        assert!(err.to_string().contains("/videos/clip.mp4"));
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_decode_error_ends_stream() {
        let mut reader = StubReader::new(5);
        reader.fail_after = Some(3);

        let report = run(reader, adapter(scenario()), None).unwrap();

        assert_eq!(report.completion, Completion::EndOfStream);
        assert_eq!(report.result.len(), 3);
    }

    #[test]
    fn test_preview_failure_disables_preview_only() {
        let mut preview = StubPreview::new(None);
        preview.fail = true;
        let closed = preview.closed.clone();

        let report = run(StubReader::new(3), adapter(scenario()), Some(preview)).unwrap();

        assert_eq!(report.result.len(), 3);
        assert_eq!(report.completion, Completion::EndOfStream);
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_reports_stage_timings_and_detection_counts() {
        let logger = RecordingLogger::default();
        let timings = logger.timings.clone();
        let metrics = logger.metrics.clone();

        DetectVideoUseCase::new(
            Box::new(StubReader::new(3)),
            adapter(scenario()),
            Some(Box::new(StubPreview::new(None))),
            Box::new(logger),
        )
        .execute(Path::new("/videos/clip.mp4"))
        .unwrap();

        assert_eq!(
            *timings.lock().unwrap(),
            vec!["detect", "preview", "detect", "preview", "detect", "preview"]
        );
        assert_eq!(*metrics.lock().unwrap(), vec![2.0, 0.0, 1.0]);
    }
}
