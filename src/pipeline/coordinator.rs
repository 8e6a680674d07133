//! Pipeline coordinator
//!
//! Owns the queues, the stages and the shutdown machinery. The caller
//! constructs a coordinator with its three collaborators, calls `start` to
//! launch one thread per stage, and `wait` to block until the sink has
//! observed end of stream (or an early stop). There is no ambient global
//! state: everything the pipeline needs lives in this value.
//!
//! # Shutdown
//!
//! Normal termination needs no coordination beyond the end-of-stream marker
//! rippling through the queues. Early termination (sink stop request, sink
//! failure, SIGINT) goes through the shared [`StopSignal`]: a small listener
//! thread waits on the signal and closes both queues, releasing any producer
//! blocked in `put` so every stage thread reaches its exit path.

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::convert::FrameConverter;
use crate::display::FrameSink;
use crate::pipeline::health::{HealthSummary, PipelineHealth};
use crate::pipeline::pacer::FramePacer;
use crate::pipeline::queue::BoundedQueue;
use crate::pipeline::stage::PipelineStage;
use crate::pipeline::stages::{ConvertStage, PresentStage, ReadStage};
use crate::pipeline::state::PipelineState;
use crate::pipeline::types::StreamItem;
use crate::source::FrameSource;
use crate::utils::sos::StopSignal;

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum buffered items per inter-stage queue
    pub queue_capacity: usize,
    /// Minimum spacing between successive presentations
    pub frame_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            // ~24 fps
            frame_interval: Duration::from_millis(42),
        }
    }
}

/// How a single stage ended.
#[derive(Debug)]
pub struct StageOutcome {
    /// Stage name as reported by [`PipelineStage::name`]
    pub stage: &'static str,
    /// `None` on clean termination, the failure otherwise
    pub error: Option<anyhow::Error>,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate result of a completed pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    pub outcomes: Vec<StageOutcome>,
    pub health: HealthSummary,
}

impl PipelineReport {
    /// Whether every stage terminated without a failure.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(StageOutcome::is_success)
    }
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.error {
                None => write!(f, "{}: ok; ", outcome.stage)?,
                Some(e) => write!(f, "{}: failed ({:#}); ", outcome.stage, e)?,
            }
        }
        write!(f, "{}", self.health)
    }
}

/// Wires Source → queue → Transform → queue → Sink and runs them.
pub struct PipelineCoordinator {
    stages: Vec<Box<dyn PipelineStage>>,
    queues: [Arc<BoundedQueue<StreamItem>>; 2],
    stop: StopSignal,
    health: Arc<PipelineHealth>,
    state: PipelineState,
    handles: Vec<(&'static str, JoinHandle<Result<()>>)>,
    shutdown_listener: Option<JoinHandle<()>>,
}

impl PipelineCoordinator {
    /// Build the full pipeline around the three collaborators.
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn FrameSource>,
        converter: Box<dyn FrameConverter>,
        sink: Box<dyn FrameSink>,
    ) -> Self {
        let read_queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let present_queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let stop = StopSignal::new();
        let health = Arc::new(PipelineHealth::new());

        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(ReadStage::new(
                source,
                read_queue.clone(),
                stop.clone(),
                health.clone(),
            )),
            Box::new(ConvertStage::new(
                converter,
                read_queue.clone(),
                present_queue.clone(),
                stop.clone(),
                health.clone(),
            )),
            Box::new(PresentStage::new(
                sink,
                present_queue.clone(),
                FramePacer::new(config.frame_interval),
                stop.clone(),
                health.clone(),
            )),
        ];

        Self {
            stages,
            queues: [read_queue, present_queue],
            stop,
            health,
            state: PipelineState::Idle,
            handles: Vec::new(),
            shutdown_listener: None,
        }
    }

    /// A handle that triggers early termination of this pipeline.
    ///
    /// Safe to hand to a signal handler or another thread.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Shared health counters for this pipeline.
    pub fn health(&self) -> Arc<PipelineHealth> {
        self.health.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Launch all stages concurrently and return once they are running.
    pub fn start(&mut self) -> Result<()> {
        if !self.state.can_transition_to(PipelineState::Running) {
            return Err(anyhow!("cannot start pipeline from state {}", self.state));
        }

        // Closes the queues once the stop signal fires, releasing any
        // producer blocked in put. Released unconditionally by wait().
        let listener = {
            let stop = self.stop.clone();
            let queues = self.queues.clone();
            std::thread::Builder::new()
                .name("pipeline-shutdown".into())
                .spawn(move || {
                    stop.wait();
                    for queue in &queues {
                        queue.close();
                    }
                })
                .context("failed to spawn shutdown listener")?
        };
        self.shutdown_listener = Some(listener);

        for stage in self.stages.drain(..) {
            let name = stage.name();
            let handle = std::thread::Builder::new()
                .name(name.to_string())
                .spawn(move || {
                    let mut stage = stage;
                    stage.run()
                })
                .with_context(|| format!("failed to spawn {name}"))?;
            self.handles.push((name, handle));
        }

        self.state = PipelineState::Running;
        info!("Pipeline: started {} stages", self.handles.len());
        Ok(())
    }

    /// Request early termination. Idempotent; safe from any thread via
    /// [`stop_signal`](Self::stop_signal).
    pub fn stop(&mut self) {
        if self.state.is_running() {
            self.state = PipelineState::Stopping;
        }
        self.stop.trigger();
    }

    /// Block until every stage has terminated, then report the run.
    pub fn wait(&mut self) -> Result<PipelineReport> {
        if self.handles.is_empty() && !self.state.is_running() && self.state != PipelineState::Stopping
        {
            return Err(anyhow!("pipeline was never started"));
        }

        let mut outcomes = Vec::with_capacity(self.handles.len());
        for (name, handle) in self.handles.drain(..) {
            let outcome = match handle.join() {
                Ok(Ok(())) => StageOutcome { stage: name, error: None },
                Ok(Err(e)) => {
                    error!("Pipeline: {} failed: {:#}", name, e);
                    StageOutcome { stage: name, error: Some(e) }
                }
                Err(_) => {
                    error!("Pipeline: {} panicked", name);
                    StageOutcome {
                        stage: name,
                        error: Some(anyhow!("stage panicked")),
                    }
                }
            };
            outcomes.push(outcome);
        }

        // All stages are done; fire the signal so the shutdown listener
        // exits even on a clean run.
        self.stop.trigger();
        if let Some(listener) = self.shutdown_listener.take()
            && listener.join().is_err()
        {
            warn!("Pipeline: shutdown listener panicked");
        }

        self.state = PipelineState::Stopped;

        let report = PipelineReport {
            outcomes,
            health: self.health.summary(),
        };
        info!("Pipeline: finished ({})", report);
        Ok(report)
    }

    /// Convenience: `start` followed by `wait`.
    pub fn run(&mut self) -> Result<PipelineReport> {
        self.start()?;
        self.wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{FrameConverter, GrayscaleConverter, IdentityConverter};
    use crate::display::{FrameSink, NullSink, Presentation};
    use crate::pipeline::types::{Frame, PixelFormat};
    use crate::source::SyntheticSource;
    use std::sync::Mutex;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            queue_capacity: 10,
            frame_interval: Duration::ZERO,
        }
    }

    /// Sink that records indices and can request an early stop.
    struct RecordingSink {
        seen: Arc<Mutex<Vec<u64>>>,
        stop_at: Option<u64>,
    }

    impl FrameSink for RecordingSink {
        fn present(&mut self, frame: &Frame) -> Result<Presentation> {
            self.seen.lock().unwrap().push(frame.index);
            match self.stop_at {
                Some(n) if frame.index >= n => Ok(Presentation::StopRequested),
                _ => Ok(Presentation::Presented),
            }
        }
    }

    #[test]
    fn test_end_to_end_exactly_once_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 25)),
            Box::new(GrayscaleConverter),
            Box::new(RecordingSink {
                seen: seen.clone(),
                stop_at: None,
            }),
        );

        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert_eq!(*seen.lock().unwrap(), (0..25).collect::<Vec<u64>>());
        assert_eq!(report.health.frames_read, 25);
        assert_eq!(report.health.frames_converted, 25);
        assert_eq!(report.health.frames_presented, 25);
        assert!(pipeline.state().is_terminal());
    }

    #[test]
    fn test_empty_stream_terminates() {
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 0)),
            Box::new(GrayscaleConverter),
            Box::new(NullSink::new()),
        );

        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert_eq!(report.health.frames_presented, 0);
    }

    #[test]
    fn test_more_frames_than_capacity() {
        // Far more frames than both queues can hold: backpressure must
        // throttle the source instead of anything being lost.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = PipelineCoordinator::new(
            PipelineConfig {
                queue_capacity: 2,
                frame_interval: Duration::ZERO,
            },
            Box::new(SyntheticSource::new(4, 4, 100)),
            Box::new(IdentityConverter),
            Box::new(RecordingSink {
                seen: seen.clone(),
                stop_at: None,
            }),
        );

        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<u64>>());
    }

    #[test]
    fn test_sink_stop_request_unwinds_all_stages() {
        // The source is effectively unbounded compared to the stop point;
        // without shutdown propagation this test would deadlock.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 1_000_000)),
            Box::new(IdentityConverter),
            Box::new(RecordingSink {
                seen: seen.clone(),
                stop_at: Some(5),
            }),
        );

        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_converter_failure_reports_failed_run() {
        struct FailAtFive {
            seen: u64,
        }
        impl FrameConverter for FailAtFive {
            fn convert(&mut self, frame: Frame) -> Result<Frame> {
                self.seen += 1;
                if self.seen == 5 {
                    anyhow::bail!("bad frame");
                }
                Ok(frame)
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 20)),
            Box::new(FailAtFive { seen: 0 }),
            Box::new(RecordingSink {
                seen: seen.clone(),
                stop_at: None,
            }),
        );

        let report = pipeline.run().unwrap();
        assert!(!report.is_success());

        // Exactly the four frames before the failure were presented, and
        // the sink terminated normally.
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        let convert = report
            .outcomes
            .iter()
            .find(|o| o.stage == "ConvertStage")
            .unwrap();
        assert!(!convert.is_success());
        let present = report
            .outcomes
            .iter()
            .find(|o| o.stage == "PresentStage")
            .unwrap();
        assert!(present.is_success());
    }

    #[test]
    fn test_external_stop_before_start_yields_short_run() {
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 1_000_000)),
            Box::new(IdentityConverter),
            Box::new(NullSink::new()),
        );

        // Simulates SIGINT arriving before (or just as) the run begins.
        pipeline.stop_signal().trigger();
        let report = pipeline.run().unwrap();
        assert!(report.is_success());
        assert!(report.health.frames_presented <= report.health.frames_read);
    }

    #[test]
    fn test_double_start_rejected() {
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 1)),
            Box::new(IdentityConverter),
            Box::new(NullSink::new()),
        );
        pipeline.start().unwrap();
        let report = pipeline.wait().unwrap();
        assert!(report.is_success());
        assert!(pipeline.start().is_err());
    }

    #[test]
    fn test_wait_without_start_rejected() {
        let mut pipeline = PipelineCoordinator::new(
            fast_config(),
            Box::new(SyntheticSource::new(4, 4, 1)),
            Box::new(IdentityConverter),
            Box::new(NullSink::new()),
        );
        assert!(pipeline.wait().is_err());
    }
}
