use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::domain::config::Config;
use crate::shared::constants::CONFIG_FILE_NAME;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("config {path} is not a key/value mapping")]
    NotAMapping { path: PathBuf },
}

/// Resolve the run configuration from an optional YAML document.
///
/// Never fails: a missing, unreadable, malformed or empty document yields
/// [`Config::default`] and the reason is logged.
pub fn resolve(path: &Path) -> Config {
    log::info!("Loading configuration from: {}", path.display());
    match load(path) {
        Ok(Some(config)) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Ok(None) => {
            log::info!("Using default configuration");
            Config::default()
        }
        Err(e) => {
            log::warn!("{e}");
            log::info!("Using default configuration");
            Config::default()
        }
    }
}

/// Read and parse the document at `path`.
///
/// `Ok(None)` means there is nothing to use: the file does not exist or the
/// document is empty (`null`, blank, or `{}`).
pub fn load(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        log::info!("Config file not found at: {}", path.display());
        return Ok(None);
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let document: serde_yaml::Value = serde_yaml::from_str(&text).map_err(parse_err)?;
    let is_empty = match &document {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Mapping(map) => map.is_empty(),
        _ => {
            return Err(ConfigError::NotAMapping {
                path: path.to_path_buf(),
            })
        }
    };
    if is_empty {
        log::warn!("Config file is empty: {}", path.display());
        return Ok(None);
    }

    serde_yaml::from_value(document).map(Some).map_err(parse_err)
}

/// `<exe dir>/../custom_bytetrack.yaml`, or the bare file name when the
/// executable path is unavailable.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("..").join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(load(&path).unwrap().is_none());
        assert_eq!(resolve(&path), Config::default());
    }

    #[rstest]
    #[case::blank("")]
    #[case::whitespace("   \n\n")]
    #[case::comment_only("# nothing here\n")]
    #[case::explicit_null("~\n")]
    #[case::empty_mapping("{}\n")]
    fn test_empty_document_yields_defaults(#[case] contents: &str) {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, contents);
        assert!(load(&path).unwrap().is_none());
        assert_eq!(resolve(&path), Config::default());
    }

    #[rstest]
    #[case::bad_syntax("track_buffer: [1, 2\n")]
    #[case::wrong_type("track_buffer: lots\n")]
    #[case::scalar_document("just a string\n")]
    #[case::sequence_document("- 1\n- 2\n")]
    fn test_malformed_document_falls_back(#[case] contents: &str) {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, contents);
        assert!(load(&path).is_err());
        assert_eq!(resolve(&path), Config::default());
    }

    #[test]
    fn test_scalar_document_reports_not_a_mapping() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "42\n");
        assert!(matches!(load(&path), Err(ConfigError::NotAMapping { .. })));
    }

    #[test]
    fn test_full_document_used_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "tracker_type: botsort\n\
             track_high_thresh: 0.5\n\
             track_low_thresh: 0.2\n\
             new_track_thresh: 0.6\n\
             track_buffer: 30\n\
             match_thresh: 0.8\n\
             fuse_score: false\n\
             motion:\n  max_iou_distance: 0.5\n",
        );
        let config = resolve(&path);
        assert_eq!(config.tracker_type, "botsort");
        assert_eq!(config.track_high_thresh, 0.5);
        assert_eq!(config.track_low_thresh, 0.2);
        assert_eq!(config.new_track_thresh, 0.6);
        assert_eq!(config.track_buffer, 30);
        assert_eq!(config.match_thresh, 0.8);
        assert!(!config.fuse_score);
        assert_eq!(config.motion.max_iou_distance, Some(0.5));
    }

    #[test]
    fn test_partial_document_keeps_present_keys() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "track_buffer: 90\nfuse_score: false\n");
        let config = resolve(&path);
        assert_eq!(config.track_buffer, 90);
        assert!(!config.fuse_score);
        assert_eq!(config.track_high_thresh, 0.6);
        assert_eq!(config.tracker_type, "bytetrack");
    }

    #[test]
    fn test_unreadable_path_falls_back() {
        // A directory exists but cannot be read as a file.
        let dir = TempDir::new().unwrap();
        assert!(matches!(load(dir.path()), Err(ConfigError::Read { .. })));
        assert_eq!(resolve(dir.path()), Config::default());
    }

    #[test]
    fn test_default_config_path_names_config_file() {
        let path = default_config_path();
        assert!(path.ends_with(CONFIG_FILE_NAME));
    }
}
