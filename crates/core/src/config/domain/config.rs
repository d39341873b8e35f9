use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Detector/tracker parameters for one run.
///
/// Resolved once at startup and passed by reference to whatever needs it.
/// Top-level keys missing from a configuration document take their value
/// from [`Config::default`]. The `motion` block is taken as a whole: a
/// document that provides `motion` without `max_iou_distance` leaves that
/// field unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker_type: String,
    pub track_high_thresh: f64,
    pub track_low_thresh: f64,
    pub new_track_thresh: f64,
    pub track_buffer: u32,
    pub match_thresh: f64,
    pub fuse_score: bool,
    pub motion: Motion,
    /// Keys this program does not interpret, kept so they show up in the dump.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iou_distance: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker_type: "bytetrack".to_string(),
            track_high_thresh: 0.6,
            track_low_thresh: 0.1,
            new_track_thresh: 0.7,
            track_buffer: 60,
            match_thresh: 0.85,
            fuse_score: true,
            motion: Motion::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            max_iou_distance: Some(0.7),
            extra: BTreeMap::new(),
        }
    }
}

/// Tracker families named by `tracker_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerKind {
    ByteTrack,
    BotSort,
    Other(String),
}

impl Config {
    pub fn tracker_kind(&self) -> TrackerKind {
        match self.tracker_type.trim().to_ascii_lowercase().as_str() {
            "bytetrack" => TrackerKind::ByteTrack,
            "botsort" => TrackerKind::BotSort,
            other => TrackerKind::Other(other.to_string()),
        }
    }

    /// YAML rendering of every key, nested blocks indented, for the startup log.
    ///
    /// Keys come out in a fixed order regardless of the source document:
    /// recognized keys in declaration order, then unrecognized keys sorted
    /// by name.
    pub fn describe(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}
