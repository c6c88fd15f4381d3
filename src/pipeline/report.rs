//! Machine-readable run report for CI consumption

use crate::artifact::GenerationTarget;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline stage a target failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Templates,
    Synthesis,
    Rendering,
    Validation,
    Assembly,
}

/// Terminal record for one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub function: String,
    pub language: String,
    pub interface: String,
    pub assembled: bool,
    /// Stage the target failed in; `None` when assembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
    /// Completion attempts spent on this target's function
    pub completion_attempts: u32,
}

impl TargetOutcome {
    pub fn assembled(
        target: &GenerationTarget,
        warnings: Vec<String>,
        elapsed: Duration,
        completion_attempts: u32,
    ) -> Self {
        Self {
            function: target.function.clone(),
            language: target.language.to_string(),
            interface: target.interface.to_string(),
            assembled: true,
            failed_stage: None,
            errors: Vec::new(),
            warnings,
            elapsed_ms: elapsed.as_millis() as u64,
            completion_attempts,
        }
    }

    pub fn failed(
        target: &GenerationTarget,
        stage: Stage,
        errors: Vec<String>,
        warnings: Vec<String>,
        elapsed: Duration,
        completion_attempts: u32,
    ) -> Self {
        Self {
            function: target.function.clone(),
            language: target.language.to_string(),
            interface: target.interface.to_string(),
            assembled: false,
            failed_stage: Some(stage),
            errors,
            warnings,
            elapsed_ms: elapsed.as_millis() as u64,
            completion_attempts,
        }
    }
}

/// Full account of one generation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<TargetOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl RunReport {
    pub fn new(project: &str, started_at: DateTime<Utc>, targets: Vec<TargetOutcome>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            project: project.to_string(),
            started_at,
            finished_at: Utc::now(),
            targets,
            output_dir: None,
        }
    }

    pub fn assembled_count(&self) -> usize {
        self.targets.iter().filter(|t| t.assembled).count()
    }

    pub fn failed_count(&self) -> usize {
        self.targets.len() - self.assembled_count()
    }

    /// Every target assembled
    pub fn is_complete_success(&self) -> bool {
        self.failed_count() == 0 && !self.targets.is_empty()
    }

    /// At least one target assembled
    pub fn is_partial_success(&self) -> bool {
        self.assembled_count() > 0
    }
}
