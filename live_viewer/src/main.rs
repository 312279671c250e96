use anyhow::Context;
use clap::Parser;
use opencv::{prelude::*, videoio::VideoWriter};
use sign_vision::core_modules::label_table::LabelTable;
use sign_vision::pipeline::RecognitionPipeline;
use sign_vision::session::{QUIT_KEY, StopReason, run_session};
use sign_vision_visualizer::{FrameBus, ServerConfig, start_server};

mod camera;
mod config;
mod dnn_classifier;
mod window;

use camera::CameraDevice;
use config::Args;
use dnn_classifier::DnnClassifier;
use window::WindowSurface;

const VIEWER_BUS_CAPACITY: usize = 2;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // --- 1. Model & Label Table ---
    let classifier = DnnClassifier::load(&args.model)?;
    log::info!("Model loaded successfully from {}", classifier.path().display());

    let labels = LabelTable::from_path(&args.labels)?;
    log::info!("Class names loaded successfully from CSV ({} classes).", labels.len());

    // --- 2. Capture Initialization ---
    let source = args.source();
    let mut camera = CameraDevice::open(source.clone())?;

    // --- 3. Output Surfaces ---
    let mut surface = WindowSurface::open(&args.window_title)?;

    if let Some(path) = &args.record {
        let size = camera.frame_size()?;
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(&path.to_string_lossy(), fourcc, camera.fps(), size, true)?;
        anyhow::ensure!(writer.is_opened()?, "could not open {} for recording", path.display());
        log::info!("Recording annotated frames to {}", path.display());
        surface = surface.with_recorder(writer);
    }

    // The runtime must outlive the session so the server keeps serving.
    let _runtime = match &args.serve {
        Some(bind_addr) => {
            let runtime = tokio::runtime::Runtime::new().context("starting visualizer runtime")?;
            let bus = FrameBus::new(VIEWER_BUS_CAPACITY);
            runtime.block_on(start_server(
                bus.clone(),
                ServerConfig {
                    bind_addr: bind_addr.clone(),
                },
            ))?;
            surface = surface.with_mirror(bus, args.web_threshold);
            Some(runtime)
        }
        None => None,
    };

    // --- 4. Main Processing Loop ---
    log::info!("Reading from {source}. Press '{QUIT_KEY}' to quit.");
    let mut pipeline = RecognitionPipeline::new(classifier, labels, args.pipeline_config());
    let summary = run_session(&mut camera, &mut surface, &mut pipeline)?;

    if summary.stop == StopReason::AcquisitionFailed {
        log::warn!(
            "Stopped after {} frames: the capture device stopped delivering.",
            summary.frames
        );
    }
    log::info!("Application closed.");
    Ok(())
}
