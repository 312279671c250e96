use std::collections::VecDeque;

use sign_vision::core_modules::classifier::Classifier;
use sign_vision::core_modules::label_table::LabelTable;
use sign_vision::pipeline::{
    FrameReport, FrameView, InputTensor, PipelineConfig, RecognitionPipeline,
};
use sign_vision::session::{CaptureDevice, CapturedFrame, StopReason, Surface, run_session};
use sign_vision::{Result, VisionError};

struct FakeFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FakeFrame {
    fn grey(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![90; (width * height * 3) as usize],
        }
    }
}

impl CapturedFrame for FakeFrame {
    fn view(&self) -> Result<FrameView<'_>> {
        FrameView::new(self.width, self.height, 3, &self.data)
    }
}

enum Grab {
    Frame(FakeFrame),
    Fail,
    End,
}

#[derive(Default)]
struct FakeCamera {
    script: VecDeque<Grab>,
    releases: u32,
}

impl FakeCamera {
    fn with(script: Vec<Grab>) -> Self {
        Self {
            script: script.into(),
            releases: 0,
        }
    }
}

impl CaptureDevice for FakeCamera {
    type Frame = FakeFrame;

    fn grab(&mut self) -> Result<Option<FakeFrame>> {
        match self.script.pop_front() {
            Some(Grab::Frame(f)) => Ok(Some(f)),
            Some(Grab::Fail) => Err(VisionError::Acquisition("camera unplugged".into())),
            Some(Grab::End) | None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

/// Presses `q` once `quit_after` frames have been shown.
#[derive(Default)]
struct FakeWindow {
    quit_after: Option<usize>,
    fail_present: bool,
    shown: Vec<Option<String>>,
    closes: u32,
}

impl Surface<FakeFrame> for FakeWindow {
    fn present(&mut self, _frame: &mut FakeFrame, report: &FrameReport) -> Result<()> {
        if self.fail_present {
            return Err(VisionError::Display("window gone".into()));
        }
        self.shown
            .push(report.annotation.as_ref().map(|a| a.text.clone()));
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        Ok(self.quit_after.is_some_and(|n| self.shown.len() >= n))
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

/// Cycles through a fixed list of score vectors, one per frame.
struct ScriptedModel {
    outputs: Vec<Vec<f32>>,
    calls: usize,
}

impl Classifier for ScriptedModel {
    fn classify(&mut self, input: &InputTensor) -> Result<Vec<f32>> {
        assert_eq!(input.shape(), [1, 48, 48, 3]);
        let out = self.outputs[self.calls % self.outputs.len()].clone();
        self.calls += 1;
        Ok(out)
    }
}

fn pipeline(outputs: Vec<Vec<f32>>) -> RecognitionPipeline<ScriptedModel> {
    let labels = LabelTable::from_reader("ClassId,SignName\n0,Stop\n1,Yield\n".as_bytes())
        .expect("labels parse");
    RecognitionPipeline::new(
        ScriptedModel { outputs, calls: 0 },
        labels,
        PipelineConfig::default(),
    )
}

#[test]
fn quit_key_stops_the_loop_and_cleans_up() {
    let mut camera = FakeCamera::with(
        (0..10).map(|_| Grab::Frame(FakeFrame::grey(320, 240))).collect(),
    );
    let mut window = FakeWindow {
        quit_after: Some(3),
        ..Default::default()
    };
    let mut pipeline = pipeline(vec![vec![0.1, 0.85, 0.05], vec![0.3, 0.45, 0.25]]);

    let summary = run_session(&mut camera, &mut window, &mut pipeline).expect("session runs");

    assert_eq!(summary.stop, StopReason::QuitRequested);
    assert_eq!(summary.frames, 3);
    assert_eq!(
        window.shown,
        vec![
            Some("Yield (85.00%)".to_string()),
            None,
            Some("Yield (85.00%)".to_string()),
        ]
    );
    assert_eq!(camera.releases, 1);
    assert_eq!(window.closes, 1);
}

#[test]
fn acquisition_failure_is_a_clean_stop() {
    let mut camera = FakeCamera::with(vec![
        Grab::Frame(FakeFrame::grey(64, 64)),
        Grab::Fail,
        Grab::Frame(FakeFrame::grey(64, 64)),
    ]);
    let mut window = FakeWindow::default();
    let mut pipeline = pipeline(vec![vec![0.9, 0.1]]);

    let summary = run_session(&mut camera, &mut window, &mut pipeline).expect("not an error");

    assert_eq!(summary.stop, StopReason::AcquisitionFailed);
    assert_eq!(summary.frames, 1);
    assert_eq!(window.shown, vec![Some("Stop (90.00%)".to_string())]);
    assert_eq!(camera.releases, 1);
    assert_eq!(window.closes, 1);
}

#[test]
fn exhausted_file_ends_the_stream() {
    let mut camera = FakeCamera::with(vec![
        Grab::Frame(FakeFrame::grey(48, 48)),
        Grab::Frame(FakeFrame::grey(48, 48)),
        Grab::End,
    ]);
    let mut window = FakeWindow::default();
    let mut pipeline = pipeline(vec![vec![0.2, 0.8]]);

    let summary = run_session(&mut camera, &mut window, &mut pipeline).expect("session runs");

    assert_eq!(summary.stop, StopReason::EndOfStream);
    assert_eq!(summary.frames, 2);
    assert_eq!(camera.releases, 1);
}

#[test]
fn display_error_still_releases_the_device() {
    let mut camera = FakeCamera::with(vec![Grab::Frame(FakeFrame::grey(32, 32))]);
    let mut window = FakeWindow {
        fail_present: true,
        ..Default::default()
    };
    let mut pipeline = pipeline(vec![vec![1.0]]);

    let err = run_session(&mut camera, &mut window, &mut pipeline).unwrap_err();

    assert!(matches!(err, VisionError::Display(_)));
    assert_eq!(camera.releases, 1);
    assert_eq!(window.closes, 1);
}

#[test]
fn inference_error_still_releases_the_device() {
    let mut camera = FakeCamera::with(vec![Grab::Frame(FakeFrame::grey(32, 32))]);
    let mut window = FakeWindow::default();
    let mut pipeline = pipeline(vec![Vec::new()]);

    let err = run_session(&mut camera, &mut window, &mut pipeline).unwrap_err();

    assert!(matches!(err, VisionError::EmptyScores));
    assert_eq!(camera.releases, 1);
    assert_eq!(window.closes, 1);
    assert!(window.shown.is_empty());
}
