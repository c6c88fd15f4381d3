//! Rule-table validator

use super::quality::QualityRule;
use super::rules::{CheckKind, Severity, ValidationRule};
use super::security::SecurityRule;
use super::syntax::SyntaxRule;
use super::{ValidationMetrics, ValidationResult};
use crate::artifact::GeneratedArtifact;

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
    /// Downgrade security findings from fatal to warning
    security_as_warning: bool,
}

impl Validator {
    pub fn new(security_as_warning: bool) -> Self {
        Self {
            rules: vec![
                Box::new(SyntaxRule),
                Box::new(SecurityRule),
                Box::new(QualityRule),
            ],
            security_as_warning,
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>, security_as_warning: bool) -> Self {
        Self {
            rules,
            security_as_warning,
        }
    }

    /// Runs every rule over the artifact and grades the findings.
    /// The artifact itself is never modified.
    pub fn validate(&self, artifact: &GeneratedArtifact) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for rule in &self.rules {
            for mut finding in rule.check(artifact) {
                if finding.check == CheckKind::Security && self.security_as_warning {
                    finding.severity = Severity::Warning;
                }
                match finding.severity {
                    Severity::Fatal => errors.push(finding),
                    Severity::Warning => warnings.push(finding),
                }
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            metrics: ValidationMetrics::measure(&artifact.content),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactKind, ArtifactSource, GenerationTarget};
    use crate::spec::{InterfaceKind, Language};

    fn artifact(content: &str) -> GeneratedArtifact {
        GeneratedArtifact::new(
            GenerationTarget {
                function: "f".into(),
                language: Language::Python,
                interface: InterfaceKind::Rest,
            },
            ArtifactKind::Logic,
            "functions/f.py",
            content,
            ArtifactSource::Llm,
        )
    }

    #[test]
    fn test_valid_artifact() {
        let result = Validator::default().validate(&artifact("def f(a, b):\n    return a + b\n"));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.metrics.lines, 2);
    }

    #[test]
    fn test_syntax_failure_is_fatal() {
        let result = Validator::default().validate(&artifact("def f(:\n    return\n"));
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|finding| finding.check == CheckKind::Syntax));
    }

    #[test]
    fn test_security_fatal_by_default() {
        let result =
            Validator::default().validate(&artifact("import os\n\n\ndef f():\n    os.system('ls')\n"));
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|finding| finding.check == CheckKind::Security));
    }

    #[test]
    fn test_security_downgrade_to_warning() {
        let validator = Validator::new(true);
        let result = validator.validate(&artifact("import os\n\n\ndef f():\n    os.system('ls')\n"));
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|finding| finding.check == CheckKind::Security));
    }

    #[test]
    fn test_quality_findings_never_block() {
        let result = Validator::default()
            .validate(&artifact("def f():\n    \"\"\"Stub.\"\"\"\n    # TODO later\n    return 1\n"));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }
}
