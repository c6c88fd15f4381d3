//! Style/complexity heuristics; findings are always warnings

use super::rules::{CheckKind, Finding, ValidationRule};
use crate::artifact::{ArtifactKind, GeneratedArtifact};
use crate::spec::Language;

const MAX_LINE_LENGTH: usize = 120;
const MAX_BODY_LINES: usize = 200;

pub struct QualityRule;

impl ValidationRule for QualityRule {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn check(&self, artifact: &GeneratedArtifact) -> Vec<Finding> {
        if !artifact.is_code() {
            return Vec::new();
        }

        let mut findings = Vec::new();

        for (index, line) in artifact.content.lines().enumerate() {
            if line.len() > MAX_LINE_LENGTH {
                findings.push(Finding::warning(
                    CheckKind::Quality,
                    format!(
                        "line {} exceeds {} characters ({})",
                        index + 1,
                        MAX_LINE_LENGTH,
                        line.len()
                    ),
                ));
            }
            let trimmed = line.trim_start();
            if trimmed.contains("TODO") || trimmed.contains("FIXME") {
                findings.push(Finding::warning(
                    CheckKind::Quality,
                    format!("unresolved marker at line {}", index + 1),
                ));
            }
        }

        let lines = artifact.content.lines().count();
        if lines > MAX_BODY_LINES {
            findings.push(Finding::warning(
                CheckKind::Quality,
                format!("artifact is {lines} lines long (threshold {MAX_BODY_LINES})"),
            ));
        }

        if artifact.kind == ArtifactKind::Logic
            && artifact.target.language == Language::Python
            && !python_entry_has_docstring(&artifact.content)
        {
            findings.push(Finding::warning(
                CheckKind::Quality,
                "entry function has no docstring".to_string(),
            ));
        }

        findings
    }
}

/// Whether the first `def` in the module is immediately followed by a
/// docstring. Only a heuristic; nested defs are not considered.
fn python_entry_has_docstring(content: &str) -> bool {
    let mut lines = content.lines();
    for line in lines.by_ref() {
        if line.trim_start().starts_with("def ") {
            break;
        }
    }
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        return trimmed.starts_with("\"\"\"") || trimmed.starts_with("'''");
    }
    true
}
