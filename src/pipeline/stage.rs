//! Pipeline stage trait

use anyhow::Result;

/// A unit of concurrent execution in the pipeline.
///
/// Each stage reads from at most one input queue, performs one opaque
/// operation per item and writes to at most one output queue. The
/// coordinator runs each stage on its own named OS thread.
///
/// # Contract
///
/// `run` processes items until end of stream, a collaborator failure, or
/// cancellation, and then returns. A stage that produces downstream MUST
/// enqueue `StreamItem::EndOfStream` exactly once before returning — even on
/// the failure path — so the next stage never blocks on a queue that will
/// not be fed again. Returning `Err` marks the stage (and the run) failed;
/// it does not abort the other stages.
pub trait PipelineStage: Send {
    /// Process the stream to completion.
    fn run(&mut self) -> Result<()>;

    /// Stage name, used for thread naming and logging.
    fn name(&self) -> &'static str;
}
