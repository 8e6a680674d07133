//! Read stage: pulls frames from the source into the pipeline
//!
//! The producer end of the first queue. Pulls frames from the
//! [`FrameSource`] collaborator one at a time, in order, and enqueues each
//! exactly once. When the source is exhausted (or fails) the stage enqueues
//! the end-of-stream marker and returns.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::sync::Arc;

use crate::pipeline::health::PipelineHealth;
use crate::pipeline::queue::BoundedQueue;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::types::StreamItem;
use crate::source::FrameSource;
use crate::utils::sos::StopSignal;

/// Source stage: `FrameSource` → queue.
pub struct ReadStage {
    source: Box<dyn FrameSource>,
    output: Arc<BoundedQueue<StreamItem>>,
    stop: StopSignal,
    health: Arc<PipelineHealth>,
}

impl ReadStage {
    pub fn new(
        source: Box<dyn FrameSource>,
        output: Arc<BoundedQueue<StreamItem>>,
        stop: StopSignal,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            source,
            output,
            stop,
            health,
        }
    }

    /// Enqueue the end-of-stream marker, tolerating a closed queue.
    ///
    /// A closed queue means shutdown already propagated from downstream, so
    /// there is nobody left who needs the marker.
    fn emit_end_of_stream(&self) {
        if self.output.put(StreamItem::EndOfStream).is_err() {
            debug!("ReadStage: output queue closed before end-of-stream marker");
        }
    }
}

impl PipelineStage for ReadStage {
    fn run(&mut self) -> Result<()> {
        info!("ReadStage: started");
        let mut count = 0u64;

        loop {
            // Observe cancellation between frames; a put blocked on a full
            // queue is released by the coordinator closing the queue.
            if self.stop.is_triggered() {
                info!("ReadStage: stop requested after {} frames", count);
                break;
            }

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    debug!("ReadStage: read frame {}", frame.index);
                    self.health.record_read();
                    if self.output.put(StreamItem::Frame(frame)).is_err() {
                        info!("ReadStage: output queue closed, stopping");
                        return Ok(());
                    }
                    count += 1;
                }
                Ok(None) => {
                    info!("ReadStage: source exhausted after {} frames", count);
                    break;
                }
                Err(e) => {
                    error!("ReadStage: source failed after {} frames: {:#}", count, e);
                    self.health.record_failure();
                    self.emit_end_of_stream();
                    return Err(e).context("frame source failed");
                }
            }
        }

        self.emit_end_of_stream();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ReadStage"
    }
}
