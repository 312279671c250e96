// THEORY:
// The overlay is split in two. Deciding *whether* to draw and *what* text to
// draw is pure and lives here. Measuring the text needs the backend's font
// engine, so layout takes the measured text size as input and returns plain
// pixel coordinates that any renderer can use.

use crate::core_modules::prediction::Prediction;

pub const FONT_SCALE: f64 = 0.8;
pub const FONT_THICKNESS: i32 = 2;

/// Background colour of the label box (RGB).
pub const BOX_COLOR: [u8; 3] = [0, 0, 0];
/// Colour of the label text (RGB).
pub const TEXT_COLOR: [u8; 3] = [255, 255, 255];

const BOX_ORIGIN: i32 = 5;
const BOX_PADDING_X: i32 = 10;
const BOX_PADDING_Y: i32 = 30;
const TEXT_ORIGIN_X: i32 = 10;
const TEXT_OFFSET_Y: i32 = 30;

/// Text to draw over a frame whose prediction cleared the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
}

/// Returns an annotation only when confidence strictly exceeds `threshold_percent`.
pub fn annotate(
    prediction: &Prediction,
    label: &str,
    threshold_percent: f32,
) -> Option<Annotation> {
    if prediction.confidence_percent() > threshold_percent {
        Some(Annotation {
            text: format!("{label} ({})", prediction.format_confidence()),
        })
    } else {
        None
    }
}

/// Axis-aligned rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoxRegion {
    pub fn bottom_right(&self) -> (i32, i32) {
        (self.x + self.width, self.y + self.height)
    }
}

/// Where the filled background box and the text baseline go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub background: BoxRegion,
    /// Bottom-left corner of the text.
    pub text_origin: (i32, i32),
}

impl OverlayLayout {
    /// Layout for text measuring `text_width` x `text_height` pixels at [`FONT_SCALE`].
    pub fn for_text(text_width: i32, text_height: i32) -> Self {
        Self {
            background: BoxRegion {
                x: BOX_ORIGIN,
                y: BOX_ORIGIN,
                width: text_width + BOX_PADDING_X,
                height: text_height + BOX_PADDING_Y,
            },
            text_origin: (TEXT_ORIGIN_X, TEXT_OFFSET_Y + text_height),
        }
    }
}
