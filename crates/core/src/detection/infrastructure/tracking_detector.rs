use std::collections::HashSet;

use crate::config::domain::config::{Config, TrackerKind};
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector::Detector;
use crate::shared::frame::Frame;

use super::bytetrack_tracker::{ByteTracker, Detection as TrackerDetection, TrackerSettings};

/// Decorator that runs a [`ByteTracker`] over another detector's output.
///
/// Detections come back in the inner detector's order and count; the only
/// change is `track_id`, set on detections that belong to an active track.
pub struct TrackingDetector {
    inner: Box<dyn Detector>,
    tracker: ByteTracker,
    seen_ids: HashSet<u32>,
}

impl TrackingDetector {
    pub fn new(inner: Box<dyn Detector>, settings: TrackerSettings) -> Self {
        Self {
            inner,
            tracker: ByteTracker::new(settings),
            seen_ids: HashSet::new(),
        }
    }

    /// Number of distinct track ids assigned so far.
    pub fn tracks_seen(&self) -> usize {
        self.seen_ids.len()
    }
}

impl Detector for TrackingDetector {
    fn warmup(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.inner.warmup()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let mut detections = self.inner.detect(frame)?;

        let inputs: Vec<TrackerDetection> = detections
            .iter()
            .map(|d| TrackerDetection {
                bbox: d.bbox(),
                score: d.confidence,
            })
            .collect();

        for track in self.tracker.update(&inputs) {
            if let Some(det) = track.det_index.and_then(|i| detections.get_mut(i)) {
                det.track_id = Some(track.id);
                self.seen_ids.insert(track.id);
            }
        }

        Ok(detections)
    }
}

/// Wraps `detector` according to the configured tracker type.
pub fn with_tracking(detector: Box<dyn Detector>, config: &Config) -> Box<dyn Detector> {
    match config.tracker_kind() {
        TrackerKind::ByteTrack => {
            log::info!("Tracking enabled: bytetrack");
            Box::new(TrackingDetector::new(
                detector,
                TrackerSettings::from_config(config),
            ))
        }
        TrackerKind::BotSort => {
            log::warn!("Tracker 'botsort' is not supported, running without tracking");
            detector
        }
        TrackerKind::Other(name) => {
            log::warn!("Unknown tracker type '{name}', running without tracking");
            detector
        }
    }
}
