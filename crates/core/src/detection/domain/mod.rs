pub mod detection;
pub mod detection_adapter;
pub mod detector;
pub mod frame_record;
pub mod frame_record_builder;
