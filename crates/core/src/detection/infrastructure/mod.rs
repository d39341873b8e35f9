pub mod bytetrack_tracker;
pub mod class_names;
pub mod execution_provider;
pub mod math;
pub mod model_resolver;
pub mod onnx_yolo_detector;
pub mod tracking_detector;
