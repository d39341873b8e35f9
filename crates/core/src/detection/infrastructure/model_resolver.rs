use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {name} not found (searched: {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Locate the detection model file.
///
/// Resolution order:
/// 1. Explicit path (must exist, no fallback)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory (next to the executable for packaged installs)
pub fn resolve(
    explicit: Option<&Path>,
    name: &str,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::Missing(path.to_path_buf()))
        };
    }

    let candidates: Vec<PathBuf> = model_cache_dir()
        .into_iter()
        .chain(bundled_dir.map(Path::to_path_buf))
        .map(|dir| dir.join(name))
        .collect();

    for candidate in &candidates {
        if candidate.is_file() {
            log::debug!("Using model at {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    Err(ModelResolveError::NotFound {
        name: name.to_string(),
        searched: candidates,
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/framebox/models/`
/// - Linux: `$XDG_CACHE_HOME/framebox/models/` or `~/.cache/framebox/models/`
/// - Windows: `%LOCALAPPDATA%/framebox/models/`
pub fn model_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir().map(|d| d.join("framebox").join("models"))
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir().map(|d| d.join("framebox").join("models"))
    }
}

/// Directory containing the running executable.
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_is_returned() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("custom.onnx");
        fs::write(&model, b"onnx").unwrap();

        assert_eq!(resolve(Some(&model), "ignored.onnx", None).unwrap(), model);
    }

    #[test]
    fn test_missing_explicit_path_does_not_fall_back() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("m.onnx");
        fs::write(&bundled, b"onnx").unwrap();
        let missing = tmp.path().join("absent.onnx");

        let err = resolve(Some(&missing), "m.onnx", Some(tmp.path())).unwrap_err();
        assert!(matches!(err, ModelResolveError::Missing(p) if p == missing));
    }

    #[test]
    fn test_finds_bundled_model() {
        let tmp = TempDir::new().unwrap();
        let name = "framebox-test-model-bundled.onnx";
        let bundled = tmp.path().join(name);
        fs::write(&bundled, b"onnx").unwrap();

        assert_eq!(resolve(None, name, Some(tmp.path())).unwrap(), bundled);
    }

    #[test]
    fn test_not_found_lists_searched_paths() {
        let tmp = TempDir::new().unwrap();
        let name = "framebox-test-model-absent.onnx";
        let err = resolve(None, name, Some(tmp.path())).unwrap_err();

        match &err {
            ModelResolveError::NotFound { searched, .. } => {
                assert!(searched.contains(&tmp.path().join(name)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains(name));
    }

    #[test]
    fn test_model_cache_dir_is_app_scoped() {
        if let Some(path) = model_cache_dir() {
            assert!(path.ends_with(Path::new("framebox").join("models")));
        }
    }
}
