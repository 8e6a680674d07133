//! Frame sources: where the pipeline's frames come from
//!
//! The read stage only sees the [`FrameSource`] trait, so the pipeline can be
//! driven by a real stream, a raw file, or a purely synthetic generator. The
//! core never depends on a decoder or any video library.

pub mod raw_file;
pub mod synthetic;

pub use raw_file::RawFileSource;
pub use synthetic::SyntheticSource;

use crate::pipeline::types::Frame;
use anyhow::Result;

/// Produces frames in playback order.
///
/// `next_frame` returns `Ok(Some(frame))` for each frame, then `Ok(None)`
/// exactly once after the last one. An `Err` means the source failed
/// mid-stream; the read stage treats it as a terminal condition.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
