// THEORY:
// Two "dumb" data containers sit on either side of preprocessing. `FrameView`
// borrows whatever the capture backend produced (interleaved 8-bit channels,
// any resolution) without copying it. `InputTensor` owns the fixed-size,
// normalised `f32` buffer the classifier consumes, laid out as a single NHWC
// image (batch of one).

use crate::error::{Result, VisionError};

/// Spatial size the classifier expects, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A borrowed, interleaved 8-bit frame. Channel order is whatever the backend uses.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    pub fn new(width: u32, height: u32, channels: u32, data: &'a [u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(VisionError::InvalidFrame(format!(
                "frame has zero area ({width}x{height})"
            )));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(VisionError::InvalidFrame(format!(
                "unsupported channel count {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(VisionError::InvalidFrame(format!(
                "expected {expected} bytes for {width}x{height}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Packs the frame into three channels: alpha is dropped, grey is replicated.
    pub fn to_three_channel(&self) -> Vec<u8> {
        match self.channels {
            3 => self.data.to_vec(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            _ => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
        }
    }
}

/// Normalised classifier input: one `height x width x 3` image, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub size: InputSize,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub const CHANNELS: usize = 3;

    /// NHWC shape with a batch dimension of one.
    pub fn shape(&self) -> [usize; 4] {
        [
            1,
            self.size.height as usize,
            self.size.width as usize,
            Self::CHANNELS,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        let data = vec![0u8; 10];
        let err = FrameView::new(4, 4, 3, &data).unwrap_err();
        assert!(matches!(err, VisionError::InvalidFrame(_)));
    }

    #[test]
    fn rejects_empty_frame() {
        assert!(FrameView::new(0, 480, 3, &[]).is_err());
    }

    #[test]
    fn rejects_two_channel_frame() {
        let data = vec![0u8; 2 * 2 * 2];
        assert!(FrameView::new(2, 2, 2, &data).is_err());
    }

    #[test]
    fn drops_alpha_channel() {
        let data = [1, 2, 3, 255, 4, 5, 6, 255];
        let frame = FrameView::new(2, 1, 4, &data).expect("valid frame");
        assert_eq!(frame.to_three_channel(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn replicates_grey_channel() {
        let data = [9, 200];
        let frame = FrameView::new(1, 2, 1, &data).expect("valid frame");
        assert_eq!(frame.to_three_channel(), vec![9, 9, 9, 200, 200, 200]);
    }
}
