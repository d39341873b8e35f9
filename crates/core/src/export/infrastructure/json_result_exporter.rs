use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::domain::frame_record::VideoResult;
use crate::export::domain::result_exporter::{output_path_for, ExportError, ResultExporter};

/// Writes the result as pretty-printed JSON (two-space indent).
///
/// Output goes to `<target>.part` first and is renamed into place, so an
/// existing file is either fully replaced or left as it was.
pub struct JsonResultExporter;

impl JsonResultExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonResultExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultExporter for JsonResultExporter {
    fn export(&self, source: &Path, result: &VideoResult) -> Result<PathBuf, ExportError> {
        let target = output_path_for(source);
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| ExportError::Serialize(Box::new(e)))?;

        let temp_path = part_path(&target);
        if let Err(source) = fs::write(&temp_path, json.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(ExportError::Write {
                path: temp_path,
                source,
            });
        }
        if let Err(source) = fs::rename(&temp_path, &target) {
            let _ = fs::remove_file(&temp_path);
            return Err(ExportError::Write {
                path: target,
                source,
            });
        }

        log::info!(
            "Wrote {} frames ({} boxes) to {}",
            result.len(),
            result.total_boxes(),
            target.display()
        );
        Ok(target)
    }
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
