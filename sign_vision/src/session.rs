// THEORY:
// A session is the capture-classify-render loop, written once against three
// seams so that the OpenCV binary and the tests drive the exact same control
// flow:
//
//   grab -> process_frame -> present -> quit_requested -> grab ...
//
// The loop is single-threaded and fully blocking. It never retries. It stops
// when the user asks, when a file source runs dry, or when a grab fails; the
// last case is an intentional stop, not an error. Whatever the reason,
// including an error half-way through an iteration, the device is released
// and the surface closed exactly once before `run_session` returns.

use crate::core_modules::classifier::Classifier;
use crate::core_modules::frame::FrameView;
use crate::error::Result;
use crate::pipeline::{FrameReport, RecognitionPipeline};

/// Key that requests a graceful shutdown.
pub const QUIT_KEY: char = 'q';

/// True when a raw key code (as returned by a `waitKey`-style poll) is [`QUIT_KEY`].
pub fn is_quit_key(code: i32) -> bool {
    code >= 0 && (code & 0xFF) == QUIT_KEY as i32
}

/// A captured frame that can lend its pixels to the pipeline.
pub trait CapturedFrame {
    fn view(&self) -> Result<FrameView<'_>>;
}

/// Source of frames: a webcam, a video file, or a fake.
pub trait CaptureDevice {
    type Frame: CapturedFrame;

    /// `Ok(None)` means the source is exhausted; `Err` means the grab failed.
    fn grab(&mut self) -> Result<Option<Self::Frame>>;

    fn release(&mut self);
}

/// Where annotated frames go.
pub trait Surface<F> {
    fn present(&mut self, frame: &mut F, report: &FrameReport) -> Result<()>;

    fn quit_requested(&mut self) -> Result<bool>;

    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    AcquisitionFailed,
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames that made it all the way to the surface.
    pub frames: u64,
    pub stop: StopReason,
}

/// Runs the loop until it stops, then releases `device` and closes `surface`.
pub fn run_session<D, S, C>(
    device: &mut D,
    surface: &mut S,
    pipeline: &mut RecognitionPipeline<C>,
) -> Result<SessionSummary>
where
    D: CaptureDevice,
    S: Surface<D::Frame>,
    C: Classifier,
{
    let outcome = drive(device, surface, pipeline);

    device.release();
    surface.close();

    if let Ok(summary) = &outcome {
        log::info!(
            "session stopped after {} frames ({:?})",
            summary.frames,
            summary.stop
        );
    }
    outcome
}

fn drive<D, S, C>(
    device: &mut D,
    surface: &mut S,
    pipeline: &mut RecognitionPipeline<C>,
) -> Result<SessionSummary>
where
    D: CaptureDevice,
    S: Surface<D::Frame>,
    C: Classifier,
{
    let mut frames = 0u64;
    loop {
        let mut frame = match device.grab() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Ok(SessionSummary {
                    frames,
                    stop: StopReason::EndOfStream,
                });
            }
            Err(e) => {
                log::error!("Failed to capture frame: {e}");
                return Ok(SessionSummary {
                    frames,
                    stop: StopReason::AcquisitionFailed,
                });
            }
        };

        let report = pipeline.process_frame(frame.view()?)?;
        if let Some(annotation) = &report.annotation {
            log::trace!("frame {frames}: {}", annotation.text);
        }

        surface.present(&mut frame, &report)?;
        frames += 1;

        if surface.quit_requested()? {
            return Ok(SessionSummary {
                frames,
                stop: StopReason::QuitRequested,
            });
        }
    }
}
