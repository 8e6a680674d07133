//! The three concrete pipeline stages
//!
//! ```text
//! ┌───────────┐    queue 1    ┌──────────────┐    queue 2    ┌──────────────┐
//! │ ReadStage │──────────────▶│ ConvertStage │──────────────▶│ PresentStage │
//! └───────────┘               └──────────────┘               └──────────────┘
//!  FrameSource                 FrameConverter                 FrameSink
//! ```
//!
//! Each stage runs on its own thread and touches nothing of the others
//! beyond the queue it shares with its neighbor.

pub mod convert_stage;
pub mod present_stage;
pub mod read_stage;

pub use convert_stage::ConvertStage;
pub use present_stage::PresentStage;
pub use read_stage::ReadStage;
