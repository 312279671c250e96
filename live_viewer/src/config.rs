use std::path::PathBuf;

use clap::Parser;
use sign_vision::pipeline::{DEFAULT_CONFIDENCE_THRESHOLD, InputSize, PipelineConfig};
use sign_vision_visualizer::DEFAULT_WEB_THRESHOLD;

use crate::camera::Source;

/// Real-time traffic sign recognition from a webcam or a video file.
#[derive(Debug, Parser)]
#[command(name = "live_viewer", version)]
pub struct Args {
    /// Classifier model (ONNX, or any format OpenCV's DNN module reads).
    #[arg(long, env = "SV_MODEL", default_value = "my_traffic_sign_model.onnx")]
    pub model: PathBuf,

    /// CSV with `ClassId` and `SignName` columns.
    #[arg(long, env = "SV_LABELS", default_value = "traffic_sign.csv")]
    pub labels: PathBuf,

    /// Camera index passed to the capture backend.
    #[arg(long, default_value_t = 0)]
    pub camera: i32,

    /// Read frames from a video file instead of a camera.
    #[arg(long, conflicts_with = "camera")]
    pub input: Option<PathBuf>,

    /// Also write every annotated frame to this video file (mp4v).
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Confidence, in percent, a prediction must exceed to be drawn.
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_parser = parse_percent)]
    pub threshold: f32,

    #[arg(long, default_value_t = 48)]
    pub input_width: u32,

    #[arg(long, default_value_t = 48)]
    pub input_height: u32,

    #[arg(long, default_value = "Traffic Sign Recognition")]
    pub window_title: String,

    /// Mirror the annotated stream to browsers at this address (needs the `web` feature).
    #[arg(long, env = "SV_BIND")]
    pub serve: Option<String>,

    /// Confidence, in percent, the browser readout requires.
    #[arg(long, default_value_t = DEFAULT_WEB_THRESHOLD, value_parser = parse_percent)]
    pub web_threshold: f32,
}

impl Args {
    pub fn source(&self) -> Source {
        match &self.input {
            Some(path) => Source::File(path.clone()),
            None => Source::Webcam(self.camera),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_size: InputSize::new(self.input_width, self.input_height),
            confidence_threshold: self.threshold,
        }
    }
}

fn parse_percent(raw: &str) -> Result<f32, String> {
    let value: f32 = raw.parse().map_err(|e| format!("`{raw}` is not a number: {e}"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0..=100"))
    }
}
