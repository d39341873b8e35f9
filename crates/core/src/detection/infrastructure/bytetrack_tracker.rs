//! ByteTrack multi-object tracker, parameterized by the run [`Config`].
//!
//! Two-stage association strategy: high-confidence detections are matched
//! first, then low-confidence detections fill remaining unmatched tracks.
//! Only sufficiently confident unmatched detections start new tracks.
use std::collections::HashSet;

use crate::config::domain::config::Config;

use super::math::bbox_iou;

/// Cost bound for the low-confidence stage when the config leaves
/// `motion.max_iou_distance` unset.
const DEFAULT_SECOND_STAGE_COST: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct Detection {
    pub bbox: [f64; 4],
    pub score: f64,
}

#[derive(Clone, Debug)]
pub struct Track {
    pub id: u32,
    pub bbox: [f64; 4],
    pub det_index: Option<usize>,
}

/// Association thresholds. Costs are `1 - IoU` (times score when fused);
/// a pair matches when its cost is at most the bound.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerSettings {
    pub high_thresh: f64,
    pub low_thresh: f64,
    pub new_track_thresh: f64,
    pub max_lost: usize,
    pub match_cost: f64,
    pub second_match_cost: f64,
    pub fuse_score: bool,
}

impl TrackerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            high_thresh: config.track_high_thresh,
            low_thresh: config.track_low_thresh,
            new_track_thresh: config.new_track_thresh,
            max_lost: config.track_buffer as usize,
            match_cost: config.match_thresh,
            second_match_cost: config
                .motion
                .max_iou_distance
                .unwrap_or(DEFAULT_SECOND_STAGE_COST),
            fuse_score: config.fuse_score,
        }
    }
}

#[derive(Clone, Debug)]
struct TrackState {
    id: u32,
    bbox: [f64; 4],
    frames_lost: usize,
    matched: bool,
    det_index: Option<usize>,
}

pub struct ByteTracker {
    settings: TrackerSettings,
    tracks: Vec<TrackState>,
    next_id: u32,
}

impl ByteTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            tracks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        let (high, low) = self.split_by_confidence(detections);

        self.reset_match_flags();
        let num_existing = self.tracks.len();
        let matched_high = self.match_high_confidence(&high);
        self.match_low_confidence(&low);
        self.create_new_tracks(&high, &matched_high);
        self.age_unmatched_tracks(num_existing);

        self.active_tracks()
    }

    fn split_by_confidence<'a>(
        &self,
        detections: &'a [Detection],
    ) -> (IndexedDets<'a>, IndexedDets<'a>) {
        let mut high = Vec::new();
        let mut low = Vec::new();
        for (i, det) in detections.iter().enumerate() {
            if det.score >= self.settings.high_thresh {
                high.push((i, det));
            } else if det.score >= self.settings.low_thresh {
                low.push((i, det));
            }
        }
        (high, low)
    }

    fn reset_match_flags(&mut self) {
        for track in &mut self.tracks {
            track.matched = false;
            track.det_index = None;
        }
    }

    fn match_high_confidence(&mut self, high: &[(usize, &Detection)]) -> HashSet<usize> {
        let track_refs: Vec<(usize, [f64; 4])> = self
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.bbox))
            .collect();

        let mut matched_det_indices = HashSet::new();
        let pairs = greedy_match(
            &track_refs,
            high,
            self.settings.match_cost,
            self.settings.fuse_score,
        );
        for (ti, di, bbox) in pairs {
            self.apply_match(ti, di, bbox);
            matched_det_indices.insert(di);
        }
        matched_det_indices
    }

    fn match_low_confidence(&mut self, low: &[(usize, &Detection)]) {
        let unmatched_refs: Vec<(usize, [f64; 4])> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.matched)
            .map(|(i, t)| (i, t.bbox))
            .collect();

        let pairs = greedy_match(&unmatched_refs, low, self.settings.second_match_cost, false);
        for (ti, di, bbox) in pairs {
            self.apply_match(ti, di, bbox);
        }
    }

    fn apply_match(&mut self, track_idx: usize, det_idx: usize, bbox: [f64; 4]) {
        let track = &mut self.tracks[track_idx];
        track.bbox = bbox;
        track.frames_lost = 0;
        track.matched = true;
        track.det_index = Some(det_idx);
    }

    fn create_new_tracks(&mut self, high: &[(usize, &Detection)], matched: &HashSet<usize>) {
        for (di, det) in high {
            if matched.contains(di) || det.score < self.settings.new_track_thresh {
                continue;
            }
            self.tracks.push(TrackState {
                id: self.next_id,
                bbox: det.bbox,
                frames_lost: 0,
                matched: true,
                det_index: Some(*di),
            });
            self.next_id += 1;
        }
    }

    fn age_unmatched_tracks(&mut self, num_existing: usize) {
        for track in self.tracks.iter_mut().take(num_existing) {
            if !track.matched {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.settings.max_lost;
        self.tracks.retain(|t| t.frames_lost <= max_lost);
    }

    /// Only matched tracks produce output; lost tracks are kept internally
    /// for re-identification within the buffer window.
    fn active_tracks(&self) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|t| t.matched)
            .map(|t| Track {
                id: t.id,
                bbox: t.bbox,
                det_index: t.det_index,
            })
            .collect()
    }
}

type IndexedDets<'a> = Vec<(usize, &'a Detection)>;

/// Greedy matching on ascending cost, each track/detection used at most once.
/// Returns `(track_idx, det_idx, det_bbox)`.
fn greedy_match(
    tracks: &[(usize, [f64; 4])],
    dets: &[(usize, &Detection)],
    max_cost: f64,
    fuse_score: bool,
) -> Vec<(usize, usize, [f64; 4])> {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (ti, bbox) in tracks {
        for (di, det) in dets {
            let mut similarity = bbox_iou(bbox, &det.bbox);
            if fuse_score {
                similarity *= det.score;
            }
            let cost = 1.0 - similarity;
            if similarity > 0.0 && cost <= max_cost {
                pairs.push((*ti, *di, cost));
            }
        }
    }
    pairs.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_tracks = HashSet::new();
    let mut used_dets = HashSet::new();
    let mut matches = Vec::new();

    for (ti, di, _) in &pairs {
        if !used_tracks.contains(ti) && !used_dets.contains(di) {
            used_tracks.insert(*ti);
            used_dets.insert(*di);
            let bbox = dets
                .iter()
                .find(|(i, _)| i == di)
                .map(|(_, d)| d.bbox)
                .unwrap_or_default();
            matches.push((*ti, *di, bbox));
        }
    }
    matches
}
