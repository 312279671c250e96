use std::fmt;
use std::path::PathBuf;

use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{self, VideoCapture},
};
use sign_vision::pipeline::FrameView;
use sign_vision::session::{CaptureDevice, CapturedFrame};
use sign_vision::{Result, VisionError};

const FALLBACK_FPS: f64 = 30.0;

#[derive(Debug, Clone)]
pub enum Source {
    Webcam(i32),
    File(PathBuf),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Webcam(index) => write!(f, "camera {index}"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One BGR frame straight from OpenCV, always continuous in memory.
pub struct MatFrame {
    pub mat: Mat,
}

impl CapturedFrame for MatFrame {
    fn view(&self) -> Result<FrameView<'_>> {
        let bytes = self
            .mat
            .data_bytes()
            .map_err(|e| VisionError::InvalidFrame(e.to_string()))?;
        FrameView::new(
            self.mat.cols() as u32,
            self.mat.rows() as u32,
            self.mat.channels() as u32,
            bytes,
        )
    }
}

pub struct CameraDevice {
    capture: VideoCapture,
    source: Source,
}

impl CameraDevice {
    pub fn open(source: Source) -> Result<Self> {
        let unavailable =
            |e: opencv::Error| VisionError::DeviceUnavailable(format!("{source}: {e}"));
        let capture = match &source {
            Source::Webcam(index) => VideoCapture::new(*index, videoio::CAP_ANY),
            Source::File(path) => {
                VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            }
        }
        .map_err(unavailable)?;

        if !capture.is_opened().map_err(unavailable)? {
            return Err(VisionError::DeviceUnavailable(format!("could not open {source}")));
        }
        log::debug!("opened {source}");
        Ok(Self { capture, source })
    }

    pub fn frame_size(&self) -> opencv::Result<Size> {
        let width = self.capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = self.capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        Ok(Size::new(width as i32, height as i32))
    }

    /// Reported frame rate, or 30 when the backend does not know.
    pub fn fps(&self) -> f64 {
        match self.capture.get(videoio::CAP_PROP_FPS) {
            Ok(fps) if fps > 0.0 => fps,
            _ => FALLBACK_FPS,
        }
    }
}

impl CaptureDevice for CameraDevice {
    type Frame = MatFrame;

    fn grab(&mut self) -> Result<Option<MatFrame>> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| VisionError::Acquisition(e.to_string()))?;

        if !ok || frame.empty() {
            return match self.source {
                Source::File(_) => Ok(None),
                Source::Webcam(_) => Err(VisionError::Acquisition(format!(
                    "{} returned no frame",
                    self.source
                ))),
            };
        }

        if !frame.is_continuous() {
            frame = frame
                .try_clone()
                .map_err(|e| VisionError::Acquisition(e.to_string()))?;
        }
        Ok(Some(MatFrame { mat: frame }))
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("releasing {} failed: {e}", self.source);
        }
    }
}
