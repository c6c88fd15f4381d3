//! Typed in-memory representation of a parsed specification

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Target language for generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "py")]
    Python,
    #[serde(alias = "js", alias = "node")]
    JavaScript,
    Go,
    #[serde(alias = "rs")]
    Rust,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    /// Info strings accepted on a fenced code block for this language
    pub fn fence_aliases(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["python", "py", "python3"],
            Language::JavaScript => &["javascript", "js", "node"],
            Language::Go => &["go", "golang"],
            Language::Rust => &["rust", "rs"],
        }
    }

    /// File extension for source files, without the dot
    pub fn source_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Go => "go",
            Language::Rust => "rs",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::Go,
            Language::Rust,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface kinds the generator knows how to emit
///
/// This is a closed set: interface generators are registered explicitly at
/// process start, there is no runtime discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Rest,
    #[serde(alias = "rpc")]
    Grpc,
    Cli,
}

impl InterfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::Rest => "rest",
            InterfaceKind::Grpc => "grpc",
            InterfaceKind::Cli => "cli",
        }
    }

    pub fn all() -> &'static [InterfaceKind] {
        &[InterfaceKind::Rest, InterfaceKind::Grpc, InterfaceKind::Cli]
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type tag used for prompt construction and template type mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    #[serde(alias = "str", alias = "text")]
    String,
    #[serde(alias = "float")]
    Number,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "bool")]
    Boolean,
    Bytes,
    #[serde(alias = "dict", alias = "object", alias = "map")]
    Mapping,
    #[serde(alias = "list", alias = "array")]
    Sequence,
    #[serde(alias = "none", alias = "void")]
    Null,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Bytes => "bytes",
            TypeTag::Mapping => "mapping",
            TypeTag::Sequence => "sequence",
            TypeTag::Null => "null",
        }
    }
}

/// One typed parameter of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub description: String,
}

fn default_true() -> bool {
    true
}

/// Input/output pair used as few-shot prompt context and test fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleSpec {
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

/// A requested interface, optionally with interface-specific settings
///
/// Accepts the shorthand form (`rest`) as well as the table form
/// (`{kind: rest, path: /add, method: POST}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InterfaceSpecRepr")]
pub struct InterfaceSpec {
    pub kind: InterfaceKind,
    #[serde(flatten)]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl InterfaceSpec {
    pub fn new(kind: InterfaceKind) -> Self {
        Self {
            kind,
            config: BTreeMap::new(),
        }
    }

    /// String-valued config entry, if present
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InterfaceSpecRepr {
    Short(InterfaceKind),
    Full {
        kind: InterfaceKind,
        #[serde(flatten)]
        config: BTreeMap<String, serde_json::Value>,
    },
}

impl From<InterfaceSpecRepr> for InterfaceSpec {
    fn from(repr: InterfaceSpecRepr) -> Self {
        match repr {
            InterfaceSpecRepr::Short(kind) => InterfaceSpec::new(kind),
            InterfaceSpecRepr::Full { kind, config } => InterfaceSpec { kind, config },
        }
    }
}

/// Scheduling hint carried through to the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// One generation unit: a function signature plus its behavior examples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<TypeTag>,
    #[serde(alias = "return_type")]
    pub output_type: TypeTag,
    /// External package requirements keyed by language name
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub examples: Vec<ExampleSpec>,
    /// Requested interfaces; empty means "inherit the project-wide set"
    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,
    #[serde(default)]
    pub priority: Priority,
}

/// A project: owns its functions plus project-wide defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub language: Language,
    /// Project-wide interface set, inherited by functions that declare none
    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,
    pub functions: Vec<FunctionSpec>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl ProjectSpec {
    /// Effective interface set for a function after inheritance
    pub fn effective_interfaces<'a>(&'a self, function: &'a FunctionSpec) -> &'a [InterfaceSpec] {
        if function.interfaces.is_empty() {
            &self.interfaces
        } else {
            &function.interfaces
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_fence_aliases() {
        assert!(Language::Python.fence_aliases().contains(&"py"));
        assert!(Language::JavaScript.fence_aliases().contains(&"js"));
        assert_eq!(Language::Go.source_extension(), "go");
    }

    #[test]
    fn test_interface_spec_shorthand() {
        let spec: InterfaceSpec = serde_yaml::from_str("rest").unwrap();
        assert_eq!(spec.kind, InterfaceKind::Rest);
        assert!(spec.config.is_empty());
    }

    #[test]
    fn test_interface_spec_table_form() {
        let spec: InterfaceSpec = serde_yaml::from_str("{kind: rest, path: /add}").unwrap();
        assert_eq!(spec.kind, InterfaceKind::Rest);
        assert_eq!(spec.config_str("path"), Some("/add"));
    }

    #[test]
    fn test_type_tag_aliases() {
        let tag: TypeTag = serde_yaml::from_str("int").unwrap();
        assert_eq!(tag, TypeTag::Integer);
        let tag: TypeTag = serde_yaml::from_str("dict").unwrap();
        assert_eq!(tag, TypeTag::Mapping);
    }

    #[test]
    fn test_effective_interfaces_inheritance() {
        let project = ProjectSpec {
            name: "demo".into(),
            version: "0.1.0".into(),
            description: String::new(),
            language: Language::Python,
            interfaces: vec![InterfaceSpec::new(InterfaceKind::Rest)],
            functions: vec![FunctionSpec {
                name: "f".into(),
                description: String::new(),
                parameters: vec![],
                input_type: None,
                output_type: TypeTag::Null,
                dependencies: BTreeMap::new(),
                examples: vec![],
                interfaces: vec![],
                priority: Priority::Normal,
            }],
        };
        let effective = project.effective_interfaces(&project.functions[0]);
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].kind, InterfaceKind::Rest);
    }
}
