//! Validation of generated artifacts
//!
//! Every artifact the orchestrator produced passes through the validator
//! before assembly: a syntax check (tree-sitter parse for the artifact's
//! language), a security scan (pattern check for known-dangerous
//! constructs), and quality heuristics. The validator never mutates an
//! artifact; it only produces a [`ValidationResult`] for it.

mod quality;
mod rules;
mod security;
mod syntax;
mod validator;

pub use rules::{CheckKind, Finding, Severity, ValidationRule};
pub use syntax::{syntax_errors, syntax_ok};
pub use validator::Validator;

use serde::{Deserialize, Serialize};

/// Outcome of validating one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub metrics: ValidationMetrics,
}

impl ValidationResult {
    pub fn has_fatal(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Cheap size/shape metrics recorded alongside the findings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub lines: usize,
    pub max_line_length: usize,
}

impl ValidationMetrics {
    pub fn measure(content: &str) -> Self {
        Self {
            lines: content.lines().count(),
            max_line_length: content.lines().map(|line| line.len()).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_measure() {
        let metrics = ValidationMetrics::measure("short\na longer line here\n");
        assert_eq!(metrics.lines, 2);
        assert_eq!(metrics.max_line_length, "a longer line here".len());
    }
}
