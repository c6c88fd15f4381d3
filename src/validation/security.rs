//! Pattern-based security scan over generated code

use super::rules::{CheckKind, Finding, ValidationRule};
use crate::artifact::GeneratedArtifact;
use crate::spec::Language;
use regex::Regex;
use std::sync::OnceLock;

struct Pattern {
    regex: Regex,
    description: &'static str,
    /// None applies to every language
    language: Option<Language>,
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let pattern = |expr: &str, description: &'static str, language: Option<Language>| Pattern {
            regex: Regex::new(expr).expect("invalid security pattern"),
            description,
            language,
        };
        vec![
            pattern(
                r"\beval\s*\(",
                "dynamic code evaluation via eval()",
                None,
            ),
            pattern(
                r"\bexec\s*\(",
                "dynamic code execution via exec()",
                Some(Language::Python),
            ),
            pattern(
                r"os\.system\s*\(",
                "shell command via os.system()",
                Some(Language::Python),
            ),
            pattern(
                r"subprocess\.[A-Za-z_]+\([^)]*shell\s*=\s*True",
                "subprocess call with shell=True",
                Some(Language::Python),
            ),
            pattern(
                r"pickle\.loads?\s*\(",
                "unsafe deserialization via pickle",
                Some(Language::Python),
            ),
            pattern(
                r"\b__import__\s*\(",
                "dynamic import via __import__()",
                Some(Language::Python),
            ),
            pattern(
                r"new\s+Function\s*\(",
                "dynamic code via new Function()",
                Some(Language::JavaScript),
            ),
            pattern(
                r#"require\s*\(\s*['"]child_process['"]\s*\)"#,
                "shell access via child_process",
                Some(Language::JavaScript),
            ),
            pattern(
                r#""os/exec""#,
                "shell access via os/exec",
                Some(Language::Go),
            ),
            pattern(
                r"\bunsafe\s*\{",
                "unsafe block",
                Some(Language::Rust),
            ),
            pattern(
                r#"(?i)(api[_-]?key|secret|password|token)\s*[:=]\s*['"][A-Za-z0-9+/_-]{16,}['"]"#,
                "hardcoded credential",
                None,
            ),
        ]
    })
}

/// Security rule: findings are fatal by default; the validator downgrades
/// them to warnings when configured to.
pub struct SecurityRule;

impl ValidationRule for SecurityRule {
    fn name(&self) -> &'static str {
        "security"
    }

    fn check(&self, artifact: &GeneratedArtifact) -> Vec<Finding> {
        if !artifact.is_code() {
            return Vec::new();
        }

        let language = artifact.target.language;
        let mut findings = Vec::new();
        for pattern in patterns() {
            if pattern.language.is_some_and(|l| l != language) {
                continue;
            }
            for (index, line) in artifact.content.lines().enumerate() {
                if pattern.regex.is_match(line) {
                    findings.push(Finding::fatal(
                        CheckKind::Security,
                        format!("{} at line {}", pattern.description, index + 1),
                    ));
                }
            }
        }
        findings
    }
}
