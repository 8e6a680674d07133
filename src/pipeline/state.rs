//! Pipeline lifecycle state

/// Lifecycle of a pipeline run.
///
/// A pipeline is built once, started once, and joined once; there is no
/// pause or restart. The coordinator validates transitions so a double
/// `start` or a `wait` before `start` is caught instead of hanging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Built but not yet started
    Idle,

    /// Stage threads are running
    Running,

    /// Stop requested, stages winding down
    Stopping,

    /// All stage threads joined; terminal
    Stopped,
}

impl PipelineState {
    /// Whether moving to `target` is a legal lifecycle step.
    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        use PipelineState::*;

        // Strictly forward-only: a pipeline is started once and joined
        // once, so repeating a state is as illegal as going backwards.
        matches!(
            (self, target),
            (Idle, Running) | (Running, Stopping) | (Running, Stopped) | (Stopping, Stopped)
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Stopped)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Idle => "Idle",
            PipelineState::Running => "Running",
            PipelineState::Stopping => "Stopping",
            PipelineState::Stopped => "Stopped",
        };
        write!(f, "{}", name)
    }
}
