//! Interface generators: template-driven serving surfaces for a function
//!
//! Each supported interface kind has a generator that resolves its template
//! bundle and renders one artifact per bundle source. Generators are wired
//! into an explicit registration table; there is no runtime discovery, so
//! the set of supported kinds is visible in one place.

mod cli;
mod grpc;
mod rest;

pub use cli::CliGenerator;
pub use grpc::GrpcGenerator;
pub use rest::RestGenerator;

use crate::artifact::{ArtifactKind, ArtifactSource, GeneratedArtifact, GenerationTarget};
use crate::spec::{FunctionSpec, InterfaceKind, InterfaceSpec, ProjectSpec};
use crate::templates::{RenderError, TemplateKey, TemplateNotFoundError, TemplateRegistry};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InterfaceError {
    #[error(transparent)]
    Template(#[from] TemplateNotFoundError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything a generator needs to render one target's interface artifacts
pub struct RenderContext<'a> {
    pub project: &'a ProjectSpec,
    pub function: &'a FunctionSpec,
    pub interface: &'a InterfaceSpec,
    pub target: &'a GenerationTarget,
}

pub trait InterfaceGenerator: Send + Sync {
    fn kind(&self) -> InterfaceKind;

    /// Config defaults merged under the declared interface config
    fn default_config(&self) -> BTreeMap<String, Value>;

    fn render(
        &self,
        registry: &TemplateRegistry,
        ctx: &RenderContext<'_>,
    ) -> Result<Vec<GeneratedArtifact>, InterfaceError> {
        render_bundle(self, registry, ctx)
    }
}

/// Resolves the generator's bundle and renders every source into an
/// artifact under `<kind>/`, namespacing interface output by its kind.
fn render_bundle<G: InterfaceGenerator + ?Sized>(
    generator: &G,
    registry: &TemplateRegistry,
    ctx: &RenderContext<'_>,
) -> Result<Vec<GeneratedArtifact>, InterfaceError> {
    let kind = generator.kind();
    let bundle = registry.resolve(TemplateKey::interface(ctx.target.language, kind))?;

    let mut config = generator.default_config();
    for (key, value) in &ctx.interface.config {
        config.insert(key.clone(), value.clone());
    }
    let context = json!({
        "project": project_context(ctx.project),
        "function": ctx.function,
        "interface": { "kind": kind.as_str(), "config": config },
    });

    let mut artifacts = Vec::with_capacity(bundle.sources.len());
    for source in &bundle.sources {
        let content = registry.render(source, &context)?;
        let file_name = source.file_name.replace("{function}", &ctx.function.name);
        artifacts.push(GeneratedArtifact::new(
            ctx.target.clone(),
            ArtifactKind::Interface,
            format!("{}/{}", kind.as_str(), file_name),
            content,
            ArtifactSource::Template,
        ));
    }
    Ok(artifacts)
}

pub(crate) fn project_context(project: &ProjectSpec) -> Value {
    json!({
        "name": project.name,
        "version": project.version,
        "description": project.description,
        "language": project.language.as_str(),
    })
}

/// Explicit table of interface generators. Adding a kind means adding a
/// generator here; nothing is discovered at runtime.
pub struct InterfaceRegistry {
    generators: HashMap<InterfaceKind, Box<dyn InterfaceGenerator>>,
}

impl InterfaceRegistry {
    /// The standard table: REST, gRPC, and CLI
    pub fn standard() -> Self {
        let mut generators: HashMap<InterfaceKind, Box<dyn InterfaceGenerator>> = HashMap::new();
        generators.insert(InterfaceKind::Rest, Box::new(RestGenerator));
        generators.insert(InterfaceKind::Grpc, Box::new(GrpcGenerator));
        generators.insert(InterfaceKind::Cli, Box::new(CliGenerator));
        Self { generators }
    }

    pub fn get(&self, kind: InterfaceKind) -> Option<&dyn InterfaceGenerator> {
        self.generators.get(&kind).map(|g| g.as_ref())
    }

    pub fn kinds(&self) -> Vec<InterfaceKind> {
        let mut kinds: Vec<InterfaceKind> = self.generators.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Language, ParameterSpec, Priority, TypeTag};

    fn sample_function() -> FunctionSpec {
        FunctionSpec {
            name: "add_numbers".to_string(),
            description: "Adds two numbers".to_string(),
            parameters: vec![
                ParameterSpec {
                    name: "a".to_string(),
                    type_tag: TypeTag::Integer,
                    required: true,
                    default: None,
                    description: String::new(),
                },
                ParameterSpec {
                    name: "b".to_string(),
                    type_tag: TypeTag::Integer,
                    required: true,
                    default: None,
                    description: String::new(),
                },
            ],
            input_type: None,
            output_type: TypeTag::Integer,
            dependencies: BTreeMap::new(),
            examples: vec![],
            interfaces: vec![],
            priority: Priority::Normal,
        }
    }

    fn sample_project() -> ProjectSpec {
        ProjectSpec {
            name: "demo".to_string(),
            version: "0.1.0".to_string(),
            description: "Demo project".to_string(),
            language: Language::Python,
            interfaces: vec![],
            functions: vec![sample_function()],
        }
    }

    fn render(kind: InterfaceKind) -> Vec<GeneratedArtifact> {
        let registry = TemplateRegistry::with_dirs(None, None);
        let project = sample_project();
        let function = sample_function();
        let interface = InterfaceSpec {
            kind,
            config: BTreeMap::new(),
        };
        let target = GenerationTarget {
            function: function.name.clone(),
            language: Language::Python,
            interface: kind,
        };
        let table = InterfaceRegistry::standard();
        table
            .get(kind)
            .unwrap()
            .render(
                &registry,
                &RenderContext {
                    project: &project,
                    function: &function,
                    interface: &interface,
                    target: &target,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_standard_table_covers_all_kinds() {
        let table = InterfaceRegistry::standard();
        assert_eq!(
            table.kinds(),
            vec![InterfaceKind::Rest, InterfaceKind::Grpc, InterfaceKind::Cli]
        );
    }

    #[test]
    fn test_rest_artifact_is_namespaced_and_valid_python() {
        let artifacts = render(InterfaceKind::Rest);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(
            artifacts[0].relative_path.to_string_lossy(),
            "rest/add_numbers_server.py"
        );
        assert!(crate::validation::syntax_ok(
            Language::Python,
            &artifacts[0].content
        ));
        assert!(artifacts[0].content.contains("port=8000"));
    }

    #[test]
    fn test_grpc_renders_proto_and_server() {
        let artifacts = render(InterfaceKind::Grpc);
        let paths: Vec<String> = artifacts
            .iter()
            .map(|a| a.relative_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec!["grpc/add_numbers.proto", "grpc/add_numbers_server.py"]
        );
        assert!(artifacts[0].content.contains("service AddNumbersService"));
        assert!(artifacts[0].content.contains("int64 a = 1;"));
    }

    #[test]
    fn test_declared_config_overrides_default_port() {
        let registry = TemplateRegistry::with_dirs(None, None);
        let project = sample_project();
        let function = sample_function();
        let mut config = BTreeMap::new();
        config.insert("port".to_string(), json!(9001));
        let interface = InterfaceSpec {
            kind: InterfaceKind::Rest,
            config,
        };
        let target = GenerationTarget {
            function: function.name.clone(),
            language: Language::Python,
            interface: InterfaceKind::Rest,
        };
        let artifacts = RestGenerator
            .render(
                &registry,
                &RenderContext {
                    project: &project,
                    function: &function,
                    interface: &interface,
                    target: &target,
                },
            )
            .unwrap();
        assert!(artifacts[0].content.contains("port=9001"));
    }

    #[test]
    fn test_unsupported_language_surfaces_template_error() {
        let registry = TemplateRegistry::with_dirs(None, None);
        let mut project = sample_project();
        project.language = Language::Go;
        let function = sample_function();
        let interface = InterfaceSpec {
            kind: InterfaceKind::Rest,
            config: BTreeMap::new(),
        };
        let target = GenerationTarget {
            function: function.name.clone(),
            language: Language::Go,
            interface: InterfaceKind::Rest,
        };
        let result = RestGenerator.render(
            &registry,
            &RenderContext {
                project: &project,
                function: &function,
                interface: &interface,
                target: &target,
            },
        );
        assert!(matches!(result, Err(InterfaceError::Template(_))));
    }
}
