//! Frame converters: the transform applied between source and sink
//!
//! The convert stage sees only the [`FrameConverter`] trait; the actual pixel
//! math is a swappable collaborator. [`GrayscaleConverter`] mirrors the
//! classic decode→grayscale→display pipeline; [`IdentityConverter`] passes
//! frames through untouched for benchmarking the plumbing itself.

use crate::pipeline::types::{Frame, PixelFormat};
use anyhow::{Result, bail};
use bytes::Bytes;

/// Converts one frame into one frame, preserving stream order.
///
/// Must be total and 1:1 — no filtering, no fan-out. Takes the frame by
/// value: frames are transferred between stages, so the converter is free to
/// consume the input.
pub trait FrameConverter: Send {
    fn convert(&mut self, frame: Frame) -> Result<Frame>;
}

/// RGB24 → GRAY8 conversion using Rec. 601 luma weights.
pub struct GrayscaleConverter;

impl FrameConverter for GrayscaleConverter {
    fn convert(&mut self, frame: Frame) -> Result<Frame> {
        if frame.format != PixelFormat::Rgb24 {
            bail!("grayscale conversion expects RGB24, got {}", frame.format);
        }

        let mut gray = Vec::with_capacity(frame.data.len() / 3);
        for px in frame.data.chunks_exact(3) {
            // y = 0.299 r + 0.587 g + 0.114 b, in integer arithmetic
            let y = (299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32) / 1000;
            gray.push(y as u8);
        }

        Ok(Frame::new(
            frame.index,
            frame.width,
            frame.height,
            PixelFormat::Gray8,
            Bytes::from(gray),
        ))
    }
}

/// Passes frames through unchanged.
pub struct IdentityConverter;

impl FrameConverter for IdentityConverter {
    fn convert(&mut self, frame: Frame) -> Result<Frame> {
        Ok(frame)
    }
}
