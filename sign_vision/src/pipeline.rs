// THEORY:
// The `pipeline` module is the top-level, per-frame API of the recognizer. It
// owns the classifier and the label table and turns one raw frame into a
// `FrameReport`: what the model thinks it sees, what that class is called,
// and whether the result is confident enough to be drawn.
//
// It is deliberately stateless between frames. Nothing learned from frame N
// influences frame N + 1; the only thing remembered is whether the model's
// output width has already been checked against the label table.

use crate::core_modules::classifier::Classifier;
use crate::core_modules::label_table::{FALLBACK_LABEL, LabelTable};
use crate::core_modules::overlay::annotate;
use crate::core_modules::preprocess::preprocess;
use crate::error::Result;

// Re-export key data structures for the public API.
pub use crate::core_modules::frame::{FrameView, InputSize, InputTensor};
pub use crate::core_modules::overlay::{Annotation, OverlayLayout};
pub use crate::core_modules::prediction::Prediction;

pub const DEFAULT_INPUT_SIZE: InputSize = InputSize::new(48, 48);
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// Configuration for the RecognitionPipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Spatial size the model was trained on.
    pub input_size: InputSize,
    /// Minimum confidence, in percent, that must be exceeded before a label is drawn.
    pub confidence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// The output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub prediction: Prediction,
    pub label: String,
    /// Present only when the prediction cleared the confidence threshold.
    pub annotation: Option<Annotation>,
}

impl FrameReport {
    pub fn is_confident(&self) -> bool {
        self.annotation.is_some()
    }
}

pub struct RecognitionPipeline<C: Classifier> {
    classifier: C,
    labels: LabelTable,
    config: PipelineConfig,
    output_checked: bool,
}

impl<C: Classifier> RecognitionPipeline<C> {
    pub fn new(classifier: C, labels: LabelTable, config: PipelineConfig) -> Self {
        Self {
            classifier,
            labels,
            config,
            output_checked: false,
        }
    }

    pub fn process_frame(&mut self, frame: FrameView<'_>) -> Result<FrameReport> {
        // Stage 1: resize and normalise
        let input = preprocess(&frame, self.config.input_size)?;

        // Stage 2: inference
        let scores = self.classifier.classify(&input)?;
        if !self.output_checked {
            self.check_output_width(scores.len());
            self.output_checked = true;
        }

        // Stage 3: argmax and label lookup
        let prediction = Prediction::from_scores(&scores)?;
        let label = self.labels.name_for(prediction.class_id).to_string();

        // Stage 4: overlay decision
        let annotation = annotate(&prediction, &label, self.config.confidence_threshold);

        Ok(FrameReport {
            prediction,
            label,
            annotation,
        })
    }

    fn check_output_width(&self, num_scores: usize) {
        let known = (0..num_scores).filter(|id| self.labels.contains(*id)).count();
        if known < num_scores {
            log::warn!(
                "model reports {} classes but only {} have names; the rest will show as \"{}\"",
                num_scores,
                known,
                FALLBACK_LABEL
            );
        } else {
            log::debug!("model output covers {} labelled classes", num_scores);
        }
    }
}
