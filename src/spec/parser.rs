//! Specification document parsing and fail-fast validation

use super::model::{FunctionSpec, InterfaceKind, Language, ProjectSpec};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Structural errors in a specification document
///
/// All variants are fatal for the whole run: a malformed spec cannot
/// produce any valid target.
#[derive(Debug, Clone, Error)]
pub enum SpecFormatError {
    #[error("specification is not valid YAML/JSON: {0}")]
    Syntax(String),

    #[error("specification declares no functions")]
    NoFunctions,

    #[error("duplicate function name: {0}")]
    DuplicateFunction(String),

    #[error("function name '{0}' is not a valid identifier")]
    InvalidFunctionName(String),

    #[error("duplicate parameter '{parameter}' in function '{function}'")]
    DuplicateParameter { function: String, parameter: String },

    #[error("function '{0}' has no interfaces (declare them on the function or project level)")]
    NoInterfaces(String),

    #[error("interface '{interface}' is not available for language '{language}' (function '{function}')")]
    UnresolvableInterface {
        function: String,
        interface: InterfaceKind,
        language: Language,
    },
}

/// Single-function document: function fields at the top level plus the
/// project-wide settings a full project would carry.
#[derive(Deserialize)]
struct SingleFunctionDoc {
    #[serde(flatten)]
    function: FunctionSpec,
    language: Language,
    #[serde(default)]
    version: Option<String>,
}

/// Parses a specification document into a validated [`ProjectSpec`].
///
/// Accepts YAML and JSON. Pure and deterministic: the same document always
/// yields a structurally equal model. Defaults (version, priority,
/// interface inheritance) are applied here so downstream components never
/// see unset fields.
pub fn parse_project(raw: &str) -> Result<ProjectSpec, SpecFormatError> {
    let value = deserialize_document(raw)?;

    let mut project = if value.get("functions").is_some() {
        serde_yaml::from_value::<ProjectSpec>(value)
            .map_err(|e| SpecFormatError::Syntax(e.to_string()))?
    } else {
        let doc = serde_yaml::from_value::<SingleFunctionDoc>(value)
            .map_err(|e| SpecFormatError::Syntax(e.to_string()))?;
        lift_single_function(doc)
    };

    validate(&mut project)?;
    Ok(project)
}

fn deserialize_document(raw: &str) -> Result<serde_yaml::Value, SpecFormatError> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') {
        let json: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| SpecFormatError::Syntax(e.to_string()))?;
        serde_yaml::to_value(json).map_err(|e| SpecFormatError::Syntax(e.to_string()))
    } else {
        serde_yaml::from_str(raw).map_err(|e| SpecFormatError::Syntax(e.to_string()))
    }
}

fn lift_single_function(doc: SingleFunctionDoc) -> ProjectSpec {
    let interfaces = doc.function.interfaces.clone();
    ProjectSpec {
        name: doc.function.name.clone(),
        version: doc.version.unwrap_or_else(|| "0.1.0".to_string()),
        description: doc.function.description.clone(),
        language: doc.language,
        interfaces,
        functions: vec![doc.function],
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(project: &mut ProjectSpec) -> Result<(), SpecFormatError> {
    if project.functions.is_empty() {
        return Err(SpecFormatError::NoFunctions);
    }

    let mut names = HashSet::new();
    for function in &project.functions {
        // Function names end up as identifiers in generated code and as
        // path segments in the package; anything else fails here, not
        // at assembly.
        if !is_identifier(&function.name) {
            return Err(SpecFormatError::InvalidFunctionName(function.name.clone()));
        }
        if !names.insert(function.name.as_str()) {
            return Err(SpecFormatError::DuplicateFunction(function.name.clone()));
        }

        let mut params = HashSet::new();
        for parameter in &function.parameters {
            if !params.insert(parameter.name.as_str()) {
                return Err(SpecFormatError::DuplicateParameter {
                    function: function.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }
        }
    }

    // Apply interface inheritance at parse time so the orchestrator only
    // ever sees the effective set.
    let project_interfaces = project.interfaces.clone();
    for function in &mut project.functions {
        if function.interfaces.is_empty() {
            function.interfaces = project_interfaces.clone();
        }
        if function.interfaces.is_empty() {
            return Err(SpecFormatError::NoInterfaces(function.name.clone()));
        }
    }

    Ok(())
}
