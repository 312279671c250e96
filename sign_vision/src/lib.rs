// THEORY:
// `sign_vision` is the backend-agnostic half of the traffic-sign recognizer.
// Everything that can be stated without a camera, a window or a neural
// network runtime lives here: the label table, turning a raw frame into the
// classifier's input tensor, reading a prediction out of a score vector, and
// deciding what (if anything) gets drawn on screen.
//
// The camera, the model runtime and the display are reached through three
// small traits (`CaptureDevice`, `Classifier`, `Surface`). The `live_viewer`
// binary implements them on top of OpenCV; the tests implement them with
// in-memory fakes.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod session;

pub use error::{Result, VisionError};
