//! Generated artifact types shared by the pipeline, validator, and assembler

use crate::spec::{InterfaceKind, Language};
use crate::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The unit of orchestration work: one (function, language, interface) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationTarget {
    pub function: String,
    pub language: Language,
    pub interface: InterfaceKind,
}

impl fmt::Display for GenerationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.function, self.language, self.interface)
    }
}

/// What role a generated file plays in the package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// LLM-synthesized business logic
    Logic,
    /// Interface adapter code (server, proto, CLI entry point)
    Interface,
    /// Generated test file
    Test,
    /// Documentation
    Doc,
    /// Dependency manifest / project scaffolding
    Manifest,
}

/// Where an artifact's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    Llm,
    Template,
}

/// One generated file's content plus metadata, prior to being written out
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub target: GenerationTarget,
    pub kind: ArtifactKind,
    /// Path relative to the package root
    pub relative_path: PathBuf,
    pub content: String,
    pub source: ArtifactSource,
    /// Attached by the validator; `None` until the artifact reaches it
    pub validation: Option<ValidationResult>,
}

impl GeneratedArtifact {
    pub fn new(
        target: GenerationTarget,
        kind: ArtifactKind,
        relative_path: impl Into<PathBuf>,
        content: impl Into<String>,
        source: ArtifactSource,
    ) -> Self {
        Self {
            target,
            kind,
            relative_path: relative_path.into(),
            content: content.into(),
            source,
            validation: None,
        }
    }

    /// True when the artifact's file extension matches the target language,
    /// i.e. the syntax checker has a grammar for it.
    pub fn is_code(&self) -> bool {
        self.relative_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.target.language.source_extension())
    }
}
