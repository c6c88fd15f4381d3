//! Template bundles and the registry that resolves them
//!
//! Templates are MiniJinja sources, embedded in the binary by default and
//! overridable from a project-local directory or the user config directory.
//! The registry resolves a `(category, language, interface)` key to an
//! immutable [`TemplateBundle`] by walking the precedence chain:
//! project-local override, user-level custom template, language-specific
//! built-in, category-generic base. Resolution results are cached for the
//! process lifetime; an unresolvable request always fails instead of
//! falling back past the chain.

mod filters;
mod registry;

pub use registry::{DiscoveredTemplate, TemplateOrigin, TemplateRegistry};

use crate::spec::{InterfaceKind, Language};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Template category: which part of the package a bundle generates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Interface,
    Test,
    Docs,
    Project,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Interface => "interface",
            TemplateCategory::Test => "test",
            TemplateCategory::Docs => "docs",
            TemplateCategory::Project => "project",
        }
    }

    pub fn all() -> &'static [TemplateCategory] {
        &[
            TemplateCategory::Interface,
            TemplateCategory::Test,
            TemplateCategory::Docs,
            TemplateCategory::Project,
        ]
    }
}

/// Resolution key for a template bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TemplateKey {
    pub category: TemplateCategory,
    pub language: Language,
    /// Only meaningful for the `Interface` category
    pub interface: Option<InterfaceKind>,
}

impl TemplateKey {
    pub fn interface(language: Language, interface: InterfaceKind) -> Self {
        Self {
            category: TemplateCategory::Interface,
            language,
            interface: Some(interface),
        }
    }

    pub fn plain(category: TemplateCategory, language: Language) -> Self {
        Self {
            category,
            language,
            interface: None,
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interface {
            Some(interface) => write!(
                f,
                "{}/{}/{}",
                self.category.as_str(),
                interface,
                self.language
            ),
            None => write!(f, "{}/{}", self.category.as_str(), self.language),
        }
    }
}

/// One template source inside a bundle
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Short name, unique within the bundle
    pub name: String,
    /// Output file name pattern; `{function}` is substituted by the generator
    pub file_name: String,
    /// MiniJinja source text
    pub body: String,
}

/// A resolved, ordered list of template sources for one key, plus the
/// context variables they expect. Immutable once built.
#[derive(Debug, Clone)]
pub struct TemplateBundle {
    pub key: TemplateKey,
    pub origin: TemplateOrigin,
    pub sources: Vec<TemplateSource>,
    /// Context variables the sources reference; rendering with any of them
    /// missing is an error
    pub required_context: Vec<String>,
}

/// No bundle matched after walking the whole precedence chain.
/// Fatal for the affected target only.
#[derive(Debug, Clone, Error)]
#[error("no template bundle for {key} (searched project-local, user, and built-in templates)")]
pub struct TemplateNotFoundError {
    pub key: TemplateKey,
}

/// Rendering failed: bad template syntax or a context variable the
/// template expected was missing (strict undefined lookup).
#[derive(Debug, Clone, Error)]
#[error("failed to render template '{template}': {message}")]
pub struct RenderError {
    pub template: String,
    pub message: String,
}

/// Builds the MiniJinja environment used for all rendering: strict
/// undefined lookups plus the case/type-mapping filters.
pub fn build_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    filters::register_filters(&mut env);
    env
}
