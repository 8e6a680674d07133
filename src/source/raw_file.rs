//! Raw RGB24 file source
//!
//! Reads tightly packed RGB24 frames of a fixed size from a file, one after
//! another, until the file is exhausted. This is the on-disk stand-in for a
//! real demuxer/decoder: `ffmpeg -i clip.mp4 -pix_fmt rgb24 -f rawvideo out.rgb`
//! produces exactly this layout.

use crate::pipeline::types::{Frame, PixelFormat};
use crate::source::FrameSource;
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streams fixed-size RGB24 frames from a raw video file.
pub struct RawFileSource {
    reader: BufReader<File>,
    width: u32,
    height: u32,
    frame_size: usize,
    next_index: u64,
}

impl RawFileSource {
    /// Open `path` as a stream of `width` x `height` RGB24 frames.
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open raw video file {}", path.display()))?;
        Ok(Self {
            reader: BufReader::new(file),
            width,
            height,
            frame_size: width as usize * height as usize * PixelFormat::Rgb24.bytes_per_pixel(),
            next_index: 0,
        })
    }
}

impl FrameSource for RawFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut data = vec![0u8; self.frame_size];
        let mut filled = 0;
        while filled < self.frame_size {
            let n = self
                .reader
                .read(&mut data[filled..])
                .context("read error on raw video file")?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.frame_size {
            bail!(
                "truncated frame {} in raw video file: got {} of {} bytes",
                self.next_index,
                filled,
                self.frame_size
            );
        }

        let frame = Frame::new(
            self.next_index,
            self.width,
            self.height,
            PixelFormat::Rgb24,
            Bytes::from(data),
        );
        self.next_index += 1;
        Ok(Some(frame))
    }
}
