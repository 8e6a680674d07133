//! Core types for the pipeline system

use bytes::Bytes;

/// Pixel layout of a frame's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Interleaved 8-bit RGB triplets
    Rgb24,
    /// Single 8-bit luma plane
    Gray8,
}

impl PixelFormat {
    /// Bytes used by one pixel in this format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Rgb24 => write!(f, "RGB24"),
            PixelFormat::Gray8 => write!(f, "GRAY8"),
        }
    }
}

/// One video frame moving through the pipeline
///
/// Frames are transferred between stages, never shared: once a stage enqueues
/// a frame it gives up ownership. The payload is `Bytes`, so the one clone a
/// test might take is cheap and never copies pixel data.
#[derive(Clone)]
pub struct Frame {
    /// Position of this frame in the source stream, starting at 0
    pub index: u64,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Pixel layout of `data`
    pub format: PixelFormat,

    /// Raw pixel payload, `width * height * bytes_per_pixel` bytes
    pub data: Bytes,
}

impl Frame {
    /// Create a frame, checking that the payload matches the dimensions.
    pub fn new(index: u64, width: u32, height: u32, format: PixelFormat, data: Bytes) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * format.bytes_per_pixel(),
            "frame payload does not match dimensions"
        );
        Self {
            index,
            width,
            height,
            format,
            data,
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("size", &self.size())
            .finish()
    }
}

/// What flows through the inter-stage queues: a frame, or the end-of-stream
/// marker.
///
/// The marker is a dedicated variant rather than an in-band magic value, so
/// no legitimate frame can ever collide with it. Protocol: each producer
/// enqueues `EndOfStream` exactly once, as the last item it ever writes to
/// that queue.
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A frame to be processed downstream
    Frame(Frame),
    /// No further items will arrive on this queue
    EndOfStream,
}

impl StreamItem {
    /// Whether this is the end-of-stream marker
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, StreamItem::EndOfStream)
    }
}
