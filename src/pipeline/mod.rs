//! Generation pipeline: orchestration and run reporting

mod orchestrator;
mod report;

pub use orchestrator::{preflight, GenerationOutcome, Orchestrator};
pub use report::{RunReport, Stage, TargetOutcome};
