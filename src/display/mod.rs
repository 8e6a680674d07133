//! Frame sinks: where frames leave the pipeline
//!
//! The present stage sees only the [`FrameSink`] trait. A sink delivers one
//! frame to its output and reports whether the operator asked to stop, which
//! is the pipeline's only early-termination request path.

use crate::pipeline::types::{Frame, PixelFormat};
use anyhow::Result;
use std::io::Write;

/// Outcome of presenting one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Frame delivered, keep the stream coming
    Presented,
    /// Frame delivered, but the operator requested termination
    StopRequested,
}

/// Delivers frames to an output surface.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame) -> Result<Presentation>;
}

/// Discards frames, counting them. Useful for benchmarks and tests.
#[derive(Default)]
pub struct NullSink {
    presented: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented so far
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> Result<Presentation> {
        self.presented += 1;
        Ok(Presentation::Presented)
    }
}

/// Renders gray frames as ASCII art on stdout.
///
/// Downsamples each frame to a small character grid so a terminal stands in
/// for a display surface. RGB frames are rendered from their red channel,
/// which is close enough for a debugging view.
pub struct AsciiSink<W: Write + Send> {
    out: W,
    cols: u32,
    rows: u32,
}

/// Luma ramp from dark to bright
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

impl AsciiSink<std::io::Stdout> {
    pub fn stdout(cols: u32, rows: u32) -> Self {
        Self::new(std::io::stdout(), cols, rows)
    }
}

impl<W: Write + Send> AsciiSink<W> {
    pub fn new(out: W, cols: u32, rows: u32) -> Self {
        Self { out, cols, rows }
    }

    fn sample(&self, frame: &Frame, col: u32, row: u32) -> u8 {
        let x = (col * frame.width / self.cols).min(frame.width - 1) as usize;
        let y = (row * frame.height / self.rows).min(frame.height - 1) as usize;
        let stride = frame.format.bytes_per_pixel();
        frame.data[(y * frame.width as usize + x) * stride]
    }
}

impl<W: Write + Send> FrameSink for AsciiSink<W> {
    fn present(&mut self, frame: &Frame) -> Result<Presentation> {
        let mut canvas = String::with_capacity((self.cols as usize + 1) * self.rows as usize + 32);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let luma = self.sample(frame, col, row) as usize;
                canvas.push(ASCII_RAMP[luma * (ASCII_RAMP.len() - 1) / 255] as char);
            }
            canvas.push('\n');
        }
        writeln!(self.out, "frame {:>6} ({})", frame.index, frame.format)?;
        self.out.write_all(canvas.as_bytes())?;
        self.out.flush()?;
        Ok(Presentation::Presented)
    }
}
