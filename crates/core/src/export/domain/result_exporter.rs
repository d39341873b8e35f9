use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::frame_record::VideoResult;
use crate::shared::constants::OUTPUT_SUFFIX;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize result: {0}")]
    Serialize(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persists a finished [`VideoResult`] next to the video it came from.
pub trait ResultExporter {
    /// Writes `result` and returns the path of the written file.
    fn export(&self, source: &Path, result: &VideoResult) -> Result<PathBuf, ExportError>;
}

/// `dir/clip.mp4` becomes `dir/clip_boxes.json`.
pub fn output_path_for(source: &Path) -> PathBuf {
    let mut name = source.file_stem().map(OsString::from).unwrap_or_default();
    name.push(OUTPUT_SUFFIX);
    source.with_file_name(name)
}
