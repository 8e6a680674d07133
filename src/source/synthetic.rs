//! Synthetic in-memory frame generator
//!
//! Produces a fixed number of RGB frames with a moving gradient, so the
//! pipeline can run (and be tested) without any input file.

use crate::pipeline::types::{Frame, PixelFormat};
use crate::source::FrameSource;
use anyhow::Result;
use bytes::Bytes;

/// Generates `count` RGB24 frames of the given dimensions.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    count: u64,
    next_index: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, count: u64) -> Self {
        Self {
            width,
            height,
            count,
            next_index: 0,
        }
    }

    fn render(&self, index: u64) -> Frame {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = vec![0u8; w * h * 3];
        let phase = (index * 8) as usize;
        for y in 0..h {
            for x in 0..w {
                let px = (y * w + x) * 3;
                data[px] = ((x * 255 / w.max(1)) + phase) as u8;
                data[px + 1] = (y * 255 / h.max(1)) as u8;
                data[px + 2] = (phase % 256) as u8;
            }
        }
        Frame::new(index, self.width, self.height, PixelFormat::Rgb24, Bytes::from(data))
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index >= self.count {
            return Ok(None);
        }
        let frame = self.render(self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}
