//! Convert stage: applies the frame transform between the two queues
//!
//! Consumer of the first queue, producer of the second. Strictly one output
//! frame per input frame, in the order received, so end-to-end ordering is
//! preserved without any reordering buffer.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::sync::Arc;

use crate::convert::FrameConverter;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::queue::BoundedQueue;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::types::StreamItem;
use crate::utils::sos::StopSignal;

/// Transform stage: queue → `FrameConverter` → queue.
pub struct ConvertStage {
    converter: Box<dyn FrameConverter>,
    input: Arc<BoundedQueue<StreamItem>>,
    output: Arc<BoundedQueue<StreamItem>>,
    stop: StopSignal,
    health: Arc<PipelineHealth>,
}

impl ConvertStage {
    pub fn new(
        converter: Box<dyn FrameConverter>,
        input: Arc<BoundedQueue<StreamItem>>,
        output: Arc<BoundedQueue<StreamItem>>,
        stop: StopSignal,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            converter,
            input,
            output,
            stop,
            health,
        }
    }

    fn forward_end_of_stream(&self) {
        if self.output.put(StreamItem::EndOfStream).is_err() {
            debug!("ConvertStage: output queue closed before end-of-stream marker");
        }
    }
}

impl PipelineStage for ConvertStage {
    fn run(&mut self) -> Result<()> {
        info!("ConvertStage: started");
        let mut count = 0u64;

        loop {
            match self.input.get() {
                Some(StreamItem::Frame(frame)) => {
                    let index = frame.index;
                    match self.converter.convert(frame) {
                        Ok(converted) => {
                            debug!("ConvertStage: converted frame {}", index);
                            self.health.record_converted();
                            if self.output.put(StreamItem::Frame(converted)).is_err() {
                                info!("ConvertStage: output queue closed, stopping");
                                return Ok(());
                            }
                            count += 1;
                        }
                        Err(e) => {
                            error!("ConvertStage: converting frame {} failed: {:#}", index, e);
                            self.health.record_failure();
                            // Marker first so the sink drains what it has
                            // and terminates normally; then stop the source,
                            // which would otherwise fill the input queue and
                            // block forever.
                            self.forward_end_of_stream();
                            self.stop.trigger();
                            return Err(e).context("frame conversion failed");
                        }
                    }
                }
                Some(StreamItem::EndOfStream) => {
                    info!("ConvertStage: end of stream after {} frames", count);
                    self.forward_end_of_stream();
                    return Ok(());
                }
                None => {
                    // Input closed by shutdown propagation. Forward the
                    // marker best-effort in case the sink is still draining.
                    info!("ConvertStage: input queue closed after {} frames", count);
                    self.forward_end_of_stream();
                    return Ok(());
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "ConvertStage"
    }
}
