/// Default ONNX model file looked up in the model directories.
pub const YOLO_MODEL_NAME: &str = "yolo11m.onnx";

/// Tracker configuration file, resolved relative to the executable's parent directory.
pub const CONFIG_FILE_NAME: &str = "custom_bytetrack.yaml";

/// Appended to the source video's stem to name the exported JSON file.
pub const OUTPUT_SUFFIX: &str = "_boxes.json";

/// Video containers offered by the file dialog.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];
