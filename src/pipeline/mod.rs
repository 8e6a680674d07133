//! Concurrent frame pipeline
//!
//! Three stages run on their own threads, connected by two bounded blocking
//! queues:
//!
//! ```text
//! ┌───────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Read    │────▶│   Convert    │────▶│   Present    │
//! │  (source) │     │ (transform)  │     │    (sink)    │
//! └───────────┘     └──────────────┘     └──────────────┘
//!       queue 1 (cap 10)      queue 2 (cap 10)
//! ```
//!
//! The queues are the only shared state. A full queue blocks its producer
//! (backpressure), an empty queue blocks its consumer, and the
//! `StreamItem::EndOfStream` marker flows through both queues to terminate
//! the run. Every frame is delivered downstream exactly once, in order.
//!
//! The [`coordinator::PipelineCoordinator`] owns the wiring and lifecycle;
//! the stages only know their collaborator trait and their queue ends.

pub mod coordinator;
pub mod health;
pub mod pacer;
pub mod queue;
pub mod stage;
pub mod stages;
pub mod state;
pub mod types;

pub use coordinator::{PipelineConfig, PipelineCoordinator, PipelineReport, StageOutcome};
pub use health::{HealthSummary, PipelineHealth};
pub use pacer::FramePacer;
pub use queue::{BoundedQueue, QueueClosed};
pub use stage::PipelineStage;
pub use state::PipelineState;
pub use types::{Frame, PixelFormat, StreamItem};
