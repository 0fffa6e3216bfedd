//! Session-scoped pipeline controller.
//!
//! A session moves through
//! `SelectSignature → SelectDocument → AwaitDetectConfirm → Detecting →
//! AwaitCleanConfirm → Cleaning → AwaitVerifyConfirm → Verifying → Done`.
//! Each user action is one [`UserIntent`]; the controller applies it to the
//! session record and re-walks the pipeline from the start, executing every
//! stage whose confirmation flag is already set.

pub mod controller;
pub mod report;
pub mod state;

pub use controller::{PipelineController, UserIntent};
pub use report::{DisplayItem, DisplaySink, EvaluationReport, Notice, StageFailure};
pub use state::PipelineState;
