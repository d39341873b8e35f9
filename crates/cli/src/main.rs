use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use clap::Parser;
use crossbeam_channel::Receiver;

use framebox_core::config::domain::config::Config;
use framebox_core::config::infrastructure::yaml_config_resolver;
use framebox_core::detection::domain::detection_adapter::DetectionAdapter;
use framebox_core::detection::infrastructure::model_resolver;
use framebox_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use framebox_core::detection::infrastructure::tracking_detector::with_tracking;
use framebox_core::export::domain::result_exporter::ResultExporter;
use framebox_core::export::infrastructure::json_result_exporter::JsonResultExporter;
use framebox_core::pipeline::detect_video_use_case::{Completion, DetectVideoUseCase};
use framebox_core::pipeline::pipeline_logger::LogPipelineLogger;
use framebox_core::preview::domain::preview_surface::PreviewSurface;
use framebox_core::preview::infrastructure::snapshot_preview::SnapshotPreview;
use framebox_core::shared::constants::{VIDEO_EXTENSIONS, YOLO_MODEL_NAME};
use framebox_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

const RULE_WIDTH: usize = 60;

/// Export per-frame object bounding boxes from a video to JSON.
#[derive(Parser)]
#[command(name = "framebox")]
struct Cli {
    /// Input MP4 file. Opens a file dialog when omitted.
    input: Option<PathBuf>,

    /// Tracker configuration (YAML). Defaults to custom_bytetrack.yaml next to the install.
    #[arg(long)]
    config: Option<PathBuf>,

    /// ONNX detection model. Defaults to the cached or bundled yolo11m.onnx.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Keep an annotated snapshot of the latest frame at this path.
    /// Type `q` and Enter to stop early and export what was processed.
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(yaml_config_resolver::default_config_path);
    let config = yaml_config_resolver::resolve(&config_path);

    let Some(input) = cli.input.clone().or_else(pick_video) else {
        log::info!("No MP4 file selected.");
        return Ok(());
    };
    validate(&input)?;

    log_config(&config);

    let detector = build_detector(&cli, &config)?;
    let preview = cli.preview.as_deref().map(build_preview);

    log::info!("Analyzing: {}", input.display());
    let use_case = DetectVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        detector,
        preview,
        Box::new(LogPipelineLogger::default()),
    );
    let report = use_case.execute(&input)?;

    if report.completion == Completion::Cancelled {
        log::info!(
            "Stopped early, exporting {} processed frames",
            report.result.len()
        );
    }
    let json_path = JsonResultExporter::new().export(&input, &report.result)?;

    log::info!("Analysis Complete");
    log::info!("JSON: {}", json_path.display());
    Ok(())
}

fn pick_video() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select MP4 for Analysis")
        .add_filter("MP4 files", VIDEO_EXTENSIONS)
        .pick_file()
}

fn validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_file() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    Ok(())
}

fn log_config(config: &Config) {
    let rule = "=".repeat(RULE_WIDTH);
    log::info!("{rule}");
    log::info!("CONFIGURATION LOADED:");
    log::info!("{rule}");
    for line in config.describe().lines() {
        log::info!("{line}");
    }
    log::info!("{rule}");
}

fn build_detector(
    cli: &Cli,
    config: &Config,
) -> Result<DetectionAdapter, Box<dyn std::error::Error>> {
    let bundled_dir = model_resolver::executable_dir();
    let model_path =
        model_resolver::resolve(cli.model.as_deref(), YOLO_MODEL_NAME, bundled_dir.as_deref())?;

    log::info!("Loading YOLO model: {}", model_path.display());
    let yolo = OnnxYoloDetector::new(&model_path, DEFAULT_CONFIDENCE)?;
    let adapter = DetectionAdapter::new(with_tracking(Box::new(yolo), config))?;
    log::info!("Model loaded successfully");
    Ok(adapter)
}

fn build_preview(path: &Path) -> Box<dyn PreviewSurface> {
    log::info!(
        "Preview snapshot: {} (type q + Enter to stop)",
        path.display()
    );
    Box::new(SnapshotPreview::new(path, Some(spawn_key_listener())))
}

/// Reads stdin on a background thread and sends once a `q` line arrives.
/// Stdin reaching EOF ends the thread without cancelling.
fn spawn_key_listener() -> Receiver<()> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().eq_ignore_ascii_case("q") {
                let _ = tx.send(());
                break;
            }
        }
    });
    rx
}
