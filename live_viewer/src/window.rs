use opencv::{
    core::{Mat, Point, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::VideoWriter,
};
use sign_vision::core_modules::overlay::{
    BOX_COLOR, FONT_SCALE, FONT_THICKNESS, OverlayLayout, TEXT_COLOR,
};
use sign_vision::pipeline::FrameReport;
use sign_vision::session::{Surface, is_quit_key};
use sign_vision::{Result, VisionError};
use sign_vision_visualizer::{DEFAULT_JPEG_QUALITY, FrameBus, FramePacket, Readout};

use crate::camera::MatFrame;

const FONT_FACE: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

fn display_error(e: opencv::Error) -> VisionError {
    VisionError::Display(e.to_string())
}

/// OpenCV colours are BGR.
fn bgr(rgb: [u8; 3]) -> Scalar {
    Scalar::new(rgb[2] as f64, rgb[1] as f64, rgb[0] as f64, 0.0)
}

/// Draws the label over a filled box in the top-left corner of `frame`.
pub fn draw_annotation(frame: &mut Mat, text: &str) -> opencv::Result<()> {
    let mut baseline = 0;
    let text_size =
        imgproc::get_text_size(text, FONT_FACE, FONT_SCALE, FONT_THICKNESS, &mut baseline)?;
    let layout = OverlayLayout::for_text(text_size.width, text_size.height);

    // Corner points are inclusive, so the box reaches `bottom_right` itself.
    let bg = layout.background;
    let (right, bottom) = bg.bottom_right();
    imgproc::rectangle_points(
        frame,
        Point::new(bg.x, bg.y),
        Point::new(right, bottom),
        bgr(BOX_COLOR),
        -1,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        frame,
        text,
        Point::new(layout.text_origin.0, layout.text_origin.1),
        FONT_FACE,
        FONT_SCALE,
        bgr(TEXT_COLOR),
        FONT_THICKNESS,
        imgproc::LINE_8,
        false,
    )
}

/// Pushes annotated frames and readouts to browser viewers.
struct Mirror {
    bus: FrameBus,
    threshold: f32,
}

impl Mirror {
    fn publish(&self, frame: &Mat, report: &FrameReport) -> anyhow::Result<()> {
        if !self.bus.has_viewers() {
            return Ok(());
        }

        let code = match frame.channels() {
            1 => imgproc::COLOR_GRAY2RGB,
            4 => imgproc::COLOR_BGRA2RGB,
            _ => imgproc::COLOR_BGR2RGB,
        };
        let mut rgb = Mat::default();
        imgproc::cvt_color(frame, &mut rgb, code, 0)?;
        let packet = FramePacket::jpeg(
            rgb.cols() as u32,
            rgb.rows() as u32,
            rgb.data_bytes()?,
            DEFAULT_JPEG_QUALITY,
        )?;

        self.bus.publish_frame(packet);
        self.bus.publish_readout(Readout::from_report(report, self.threshold));
        Ok(())
    }
}

/// The desktop window, plus optional recording and browser mirroring.
pub struct WindowSurface {
    title: String,
    recorder: Option<VideoWriter>,
    mirror: Option<Mirror>,
}

impl WindowSurface {
    pub fn open(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(display_error)?;
        Ok(Self {
            title: title.to_string(),
            recorder: None,
            mirror: None,
        })
    }

    pub fn with_recorder(mut self, writer: VideoWriter) -> Self {
        self.recorder = Some(writer);
        self
    }

    pub fn with_mirror(mut self, bus: FrameBus, threshold: f32) -> Self {
        self.mirror = Some(Mirror { bus, threshold });
        self
    }
}

impl Surface<MatFrame> for WindowSurface {
    fn present(&mut self, frame: &mut MatFrame, report: &FrameReport) -> Result<()> {
        if let Some(annotation) = &report.annotation {
            draw_annotation(&mut frame.mat, &annotation.text).map_err(display_error)?;
        }

        if let Some(writer) = self.recorder.as_mut() {
            writer.write(&frame.mat).map_err(display_error)?;
        }

        if let Some(mirror) = &self.mirror {
            // Mirroring failures are logged, never fatal.
            if let Err(e) = mirror.publish(&frame.mat, report) {
                log::warn!("could not mirror frame: {e:#}");
            }
        }

        highgui::imshow(&self.title, &frame.mat).map_err(display_error)
    }

    fn quit_requested(&mut self) -> Result<bool> {
        let key = highgui::wait_key(1).map_err(display_error)?;
        Ok(is_quit_key(key))
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.recorder.take() {
            if let Err(e) = writer.release() {
                log::warn!("closing recording failed: {e}");
            }
        }
        if let Err(e) = highgui::destroy_all_windows() {
            log::warn!("closing windows failed: {e}");
        }
    }
}
