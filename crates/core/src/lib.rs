//! Core library for exporting per-frame object detections from a video.
//!
//! Layout follows a domain/infrastructure split: `domain` modules hold the
//! traits and pure logic, `infrastructure` modules adapt external libraries
//! (ffmpeg, ONNX Runtime, the filesystem) to those traits.

pub mod config;
pub mod detection;
pub mod export;
pub mod pipeline;
pub mod preview;
pub mod shared;
pub mod video;
