//! Tree-sitter based syntax checking for generated code

use super::rules::{CheckKind, Finding, ValidationRule};
use crate::artifact::GeneratedArtifact;
use crate::spec::Language;
use tree_sitter::{Node, Parser};

fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        // The TypeScript grammar is a superset of JavaScript
        Language::JavaScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
    }
}

/// Parses `source` and reports every error/missing node with its location.
pub fn syntax_errors(language: Language, source: &str) -> Vec<String> {
    let mut parser = Parser::new();
    if parser.set_language(&grammar(language)).is_err() {
        return vec![format!("failed to load {} grammar", language)];
    }

    let Some(tree) = parser.parse(source, None) else {
        return vec!["parser produced no tree".to_string()];
    };

    let mut errors = Vec::new();
    collect_errors(tree.root_node(), &mut errors);
    errors
}

/// True when `source` parses without errors for `language`
pub fn syntax_ok(language: Language, source: &str) -> bool {
    syntax_errors(language, source).is_empty()
}

fn collect_errors(node: Node, errors: &mut Vec<String>) {
    if !node.has_error() {
        return;
    }
    if node.is_error() || node.is_missing() {
        let start = node.start_position();
        let what = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_string()
        };
        errors.push(format!("{} at line {}", what, start.row + 1));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, errors);
    }
}

/// Syntax rule: fatal findings for artifacts that fail to parse.
/// Only applies to artifacts written in the target language; docs,
/// manifests, and proto files are skipped.
pub struct SyntaxRule;

impl ValidationRule for SyntaxRule {
    fn name(&self) -> &'static str {
        "syntax"
    }

    fn check(&self, artifact: &GeneratedArtifact) -> Vec<Finding> {
        if !artifact.is_code() {
            return Vec::new();
        }

        syntax_errors(artifact.target.language, &artifact.content)
            .into_iter()
            .map(|message| Finding::fatal(CheckKind::Syntax, message))
            .collect()
    }
}
