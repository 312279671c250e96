// THEORY:
// Preprocessing reproduces exactly what the model saw during training: the
// whole frame is squeezed (not cropped) to the model's input size with a
// bilinear filter, then every byte is divided by 255. No mean subtraction,
// no channel reordering; the model was trained on frames in capture order.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};

use crate::core_modules::frame::{FrameView, InputSize, InputTensor};
use crate::error::{Result, VisionError};

const MAX_INTENSITY: f32 = 255.0;

/// Resizes `frame` to `size` and scales intensities into `[0, 1]`.
pub fn preprocess(frame: &FrameView<'_>, size: InputSize) -> Result<InputTensor> {
    if size.width == 0 || size.height == 0 {
        return Err(VisionError::InvalidFrame(format!(
            "classifier input size {}x{} has zero area",
            size.width, size.height
        )));
    }

    let packed = frame.to_three_channel();
    let source: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width, frame.height, packed).ok_or_else(|| {
            VisionError::InvalidFrame(format!(
                "buffer does not fit a {}x{} image",
                frame.width, frame.height
            ))
        })?;

    let resized = if source.dimensions() == (size.width, size.height) {
        source
    } else {
        imageops::resize(&source, size.width, size.height, FilterType::Triangle)
    };

    let data = resized
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / MAX_INTENSITY)
        .collect();

    Ok(InputTensor { size, data })
}
