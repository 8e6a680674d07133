//! Present stage: delivers frames to the sink at the target frame rate
//!
//! The terminal stage. Consumes the second queue, paces deliveries to the
//! configured frame interval and hands each frame to the [`FrameSink`]
//! collaborator. A stop request from the sink (the operator pressing quit)
//! triggers the shared stop signal so the upstream stages unwind too,
//! instead of blocking forever against queues nobody drains.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::sync::Arc;

use crate::display::{FrameSink, Presentation};
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::pacer::FramePacer;
use crate::pipeline::queue::BoundedQueue;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::types::StreamItem;
use crate::utils::sos::StopSignal;

/// Sink stage: queue → pacing → `FrameSink`.
pub struct PresentStage {
    sink: Box<dyn FrameSink>,
    input: Arc<BoundedQueue<StreamItem>>,
    pacer: FramePacer,
    stop: StopSignal,
    health: Arc<PipelineHealth>,
}

impl PresentStage {
    pub fn new(
        sink: Box<dyn FrameSink>,
        input: Arc<BoundedQueue<StreamItem>>,
        pacer: FramePacer,
        stop: StopSignal,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            sink,
            input,
            pacer,
            stop,
            health,
        }
    }
}

impl PipelineStage for PresentStage {
    fn run(&mut self) -> Result<()> {
        info!(
            "PresentStage: started (target interval {:?})",
            self.pacer.interval()
        );
        let mut count = 0u64;

        loop {
            match self.input.get() {
                Some(StreamItem::Frame(frame)) => {
                    self.pacer.pace();
                    debug!("PresentStage: presenting frame {}", frame.index);
                    match self.sink.present(&frame) {
                        Ok(Presentation::Presented) => {
                            self.health.record_presented();
                            count += 1;
                        }
                        Ok(Presentation::StopRequested) => {
                            self.health.record_presented();
                            count += 1;
                            info!("PresentStage: stop requested after {} frames", count);
                            // Terminate immediately without draining; the
                            // stop signal propagates upstream.
                            self.stop.trigger();
                            return Ok(());
                        }
                        Err(e) => {
                            error!("PresentStage: presenting frame {} failed: {:#}", frame.index, e);
                            self.health.record_failure();
                            self.stop.trigger();
                            return Err(e).context("frame presentation failed");
                        }
                    }
                }
                Some(StreamItem::EndOfStream) => {
                    info!("PresentStage: finished after {} frames", count);
                    return Ok(());
                }
                None => {
                    info!("PresentStage: input queue closed after {} frames", count);
                    return Ok(());
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "PresentStage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{Frame, PixelFormat};
    use anyhow::anyhow;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records presented frame indices; optionally requests a stop or fails.
    struct ScriptedSink {
        seen: Arc<Mutex<Vec<u64>>>,
        stop_after: Option<u64>,
        fail_after: Option<u64>,
    }

    impl FrameSink for ScriptedSink {
        fn present(&mut self, frame: &Frame) -> Result<Presentation> {
            if let Some(n) = self.fail_after
                && frame.index >= n
            {
                return Err(anyhow!("display lost"));
            }
            self.seen.lock().unwrap().push(frame.index);
            if let Some(n) = self.stop_after
                && frame.index >= n
            {
                return Ok(Presentation::StopRequested);
            }
            Ok(Presentation::Presented)
        }
    }

    fn gray_frame(index: u64) -> Frame {
        Frame::new(index, 2, 2, PixelFormat::Gray8, Bytes::from(vec![0u8; 4]))
    }

    fn unpaced() -> FramePacer {
        FramePacer::new(Duration::ZERO)
    }

    #[test]
    fn test_presents_all_frames_in_order() {
        let input = Arc::new(BoundedQueue::new(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let health = Arc::new(PipelineHealth::new());

        for i in 0..5 {
            input.put(StreamItem::Frame(gray_frame(i))).unwrap();
        }
        input.put(StreamItem::EndOfStream).unwrap();

        let mut stage = PresentStage::new(
            Box::new(ScriptedSink {
                seen: seen.clone(),
                stop_after: None,
                fail_after: None,
            }),
            input,
            unpaced(),
            StopSignal::new(),
            health.clone(),
        );
        stage.run().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(health.frames_presented(), 5);
    }

    #[test]
    fn test_empty_stream_presents_nothing() {
        let input = Arc::new(BoundedQueue::new(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        input.put(StreamItem::EndOfStream).unwrap();

        let mut stage = PresentStage::new(
            Box::new(ScriptedSink {
                seen: seen.clone(),
                stop_after: None,
                fail_after: None,
            }),
            input,
            unpaced(),
            StopSignal::new(),
            Arc::new(PipelineHealth::new()),
        );
        stage.run().unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_request_triggers_signal_without_draining() {
        let input = Arc::new(BoundedQueue::new(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let stop = StopSignal::new();

        for i in 0..6 {
            input.put(StreamItem::Frame(gray_frame(i))).unwrap();
        }
        input.put(StreamItem::EndOfStream).unwrap();

        let mut stage = PresentStage::new(
            Box::new(ScriptedSink {
                seen: seen.clone(),
                stop_after: Some(2),
                fail_after: None,
            }),
            input.clone(),
            unpaced(),
            stop.clone(),
            Arc::new(PipelineHealth::new()),
        );
        stage.run().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert!(stop.is_triggered());
        // Remaining items were deliberately left in the queue.
        assert!(!input.is_empty());
    }

    #[test]
    fn test_sink_failure_triggers_signal() {
        let input = Arc::new(BoundedQueue::new(10));
        let stop = StopSignal::new();
        let health = Arc::new(PipelineHealth::new());

        for i in 0..3 {
            input.put(StreamItem::Frame(gray_frame(i))).unwrap();
        }

        let mut stage = PresentStage::new(
            Box::new(ScriptedSink {
                seen: Arc::new(Mutex::new(Vec::new())),
                stop_after: None,
                fail_after: Some(1),
            }),
            input,
            unpaced(),
            stop.clone(),
            health.clone(),
        );
        assert!(stage.run().is_err());
        assert!(stop.is_triggered());
        assert_eq!(health.stage_failures(), 1);
    }

    #[test]
    fn test_pacing_spaces_out_deliveries() {
        let input = Arc::new(BoundedQueue::new(10));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let interval = Duration::from_millis(20);

        for i in 0..4 {
            input.put(StreamItem::Frame(gray_frame(i))).unwrap();
        }
        input.put(StreamItem::EndOfStream).unwrap();

        let mut stage = PresentStage::new(
            Box::new(ScriptedSink {
                seen: seen.clone(),
                stop_after: None,
                fail_after: None,
            }),
            input,
            FramePacer::new(interval),
            StopSignal::new(),
            Arc::new(PipelineHealth::new()),
        );

        let start = std::time::Instant::now();
        stage.run().unwrap();

        // 4 frames, first unpaced: at least 3 intervals in total.
        assert!(start.elapsed() >= 3 * interval);
        assert_eq!(seen.lock().unwrap().len(), 4);
    }
}
