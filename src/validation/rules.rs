//! Validation rule trait and finding types

use crate::artifact::GeneratedArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which validator stage produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Syntax,
    Security,
    Quality,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Syntax => "syntax",
            CheckKind::Security => "security",
            CheckKind::Quality => "quality",
        }
    }
}

/// Finding severity: fatal blocks assembly of the artifact, warnings do not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Warning,
}

/// One validator finding against an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub check: CheckKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn fatal(check: CheckKind, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Fatal,
            message: message.into(),
        }
    }

    pub fn warning(check: CheckKind, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.check.as_str(), self.message)
    }
}

/// A single validation check over one artifact
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, artifact: &GeneratedArtifact) -> Vec<Finding>;
}
