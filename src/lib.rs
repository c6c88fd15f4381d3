//! specforge - spec-driven package generation with LLM-synthesized logic
//!
//! This library turns a declarative function specification into a runnable
//! software package: function bodies are synthesized by an LLM backend,
//! serving interfaces (REST, gRPC, CLI) are rendered from templates, every
//! artifact is validated, and the result is assembled into a deterministic
//! package layout.
//!
//! # Core Concepts
//!
//! - **Spec**: a YAML/JSON document declaring functions (name, typed
//!   parameters, examples) and the interfaces to expose them through
//! - **Target**: one (function, language, interface) triple; each run fans
//!   out over all targets and isolates failures per target
//! - **Completion Gateway**: the single seam to the LLM backend, with
//!   deterministic prompts, timeouts, and bounded retry
//! - **Template Registry**: resolves interface/test/docs/manifest template
//!   bundles, overridable per project or per user
//!
//! # Example Usage
//!
//! ```ignore
//! use specforge::config::GenerationConfig;
//! use specforge::llm::GenAiClient;
//! use specforge::pipeline::Orchestrator;
//! use specforge::spec::parse_project;
//! use std::sync::Arc;
//!
//! async fn generate(raw_spec: &str) -> anyhow::Result<()> {
//!     let project = parse_project(raw_spec)?;
//!     let config = GenerationConfig::default();
//!     let client = Arc::new(GenAiClient::new(
//!         config.provider,
//!         config.model.clone(),
//!         config.request_timeout,
//!     ));
//!     let orchestrator = Orchestrator::new(client, config.clone());
//!     let outcome = orchestrator.run(&project).await?;
//!     outcome.plan.materialize(&config.output_dir.join(&project.name))?;
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`spec`]: spec model and parser
//! - [`llm`]: completion client trait, gateway, and response parsing
//! - [`templates`]: template bundles and the resolving registry
//! - [`interfaces`]: interface generators (REST, gRPC, CLI)
//! - [`validation`]: syntax, security, and quality checks
//! - [`pipeline`]: orchestration and run reporting
//! - [`assemble`]: package plan, collision handling, and writing

pub mod artifact;
pub mod assemble;
pub mod cli;
pub mod config;
pub mod interfaces;
pub mod llm;
pub mod pipeline;
pub mod spec;
pub mod templates;
pub mod validation;

pub use artifact::{ArtifactKind, ArtifactSource, GeneratedArtifact, GenerationTarget};
pub use assemble::{AssembleError, PackagePlan};
pub use config::{CollisionConfig, CollisionPolicy, ConfigError, GenerationConfig};
pub use llm::{CompletionClient, CompletionError, CompletionGateway, GenAiClient};
pub use pipeline::{GenerationOutcome, Orchestrator, RunReport};
pub use spec::{parse_project, FunctionSpec, Language, ProjectSpec, SpecFormatError};
pub use templates::{TemplateKey, TemplateRegistry};
pub use validation::{ValidationResult, Validator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
