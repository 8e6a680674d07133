//! Health counters for the pipeline
//!
//! Shared between all three stages and the coordinator. All fields are
//! atomics, so recording is lock-free and safe from any stage thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn unix_micros_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_micros() as u64
}

/// Counters describing pipeline progress and failures.
pub struct PipelineHealth {
    /// Frames read from the source
    frames_read: AtomicU64,

    /// Frames successfully converted
    frames_converted: AtomicU64,

    /// Frames delivered to the sink
    frames_presented: AtomicU64,

    /// Stage failures (source, converter or sink errors)
    stage_failures: AtomicU64,

    /// Timestamp (Unix microseconds) of the last recorded frame activity
    last_frame_time: AtomicU64,
}

impl PipelineHealth {
    pub fn new() -> Self {
        Self {
            frames_read: AtomicU64::new(0),
            frames_converted: AtomicU64::new(0),
            frames_presented: AtomicU64::new(0),
            stage_failures: AtomicU64::new(0),
            last_frame_time: AtomicU64::new(unix_micros_now()),
        }
    }

    /// Record a frame obtained from the source.
    pub fn record_read(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
        self.last_frame_time.store(unix_micros_now(), Ordering::Relaxed);
    }

    /// Record a successful conversion.
    pub fn record_converted(&self) {
        self.frames_converted.fetch_add(1, Ordering::Relaxed);
        self.last_frame_time.store(unix_micros_now(), Ordering::Relaxed);
    }

    /// Record a frame delivered to the sink.
    pub fn record_presented(&self) {
        self.frames_presented.fetch_add(1, Ordering::Relaxed);
        self.last_frame_time.store(unix_micros_now(), Ordering::Relaxed);
    }

    /// Record a stage failure.
    pub fn record_failure(&self) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read.load(Ordering::Relaxed)
    }

    pub fn frames_converted(&self) -> u64 {
        self.frames_converted.load(Ordering::Relaxed)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Relaxed)
    }

    pub fn stage_failures(&self) -> u64 {
        self.stage_failures.load(Ordering::Relaxed)
    }

    /// Whether no frame activity was recorded for longer than `threshold`.
    ///
    /// A stalled-but-unfinished pipeline usually means a stage stopped
    /// draining its queue; tests use this as a deadlock tripwire.
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        let elapsed = unix_micros_now().saturating_sub(self.last_frame_time.load(Ordering::Relaxed));
        elapsed > threshold.as_micros() as u64
    }

    /// Snapshot the counters.
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            frames_read: self.frames_read(),
            frames_converted: self.frames_converted(),
            frames_presented: self.frames_presented(),
            stage_failures: self.stage_failures(),
        }
    }
}

impl Default for PipelineHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of [`PipelineHealth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSummary {
    pub frames_read: u64,
    pub frames_converted: u64,
    pub frames_presented: u64,
    pub stage_failures: u64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} read, {} converted, {} presented, {} failures",
            self.frames_read, self.frames_converted, self.frames_presented, self.stage_failures
        )
    }
}
