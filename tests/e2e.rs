//! End-to-end generation tests against the scripted mock backend
//!
//! These tests run the full pipeline: spec parsing, synthesis via the
//! mock client, template rendering, validation, assembly, and writing
//! the package to a temporary directory.

use specforge::config::GenerationConfig;
use specforge::llm::{MockCompletion, MockCompletionClient};
use specforge::pipeline::Orchestrator;
use specforge::spec::{parse_project, SpecFormatError};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ADD_NUMBERS_SPEC: &str = r#"
name: calculator
version: 1.2.0
description: Small demo calculator
language: python
interfaces: [rest]
functions:
  - name: add_numbers
    description: Adds two numbers together
    parameters:
      - {name: a, type: integer, description: first addend}
      - {name: b, type: integer, description: second addend}
    output_type: integer
    dependencies:
      python: [numpy]
    examples:
      - {input: {a: 5, b: 3}, output: 8}
      - {input: {a: -2, b: 2}, output: 0}
"#;

const ADD_NUMBERS_COMPLETION: &str = r#"Sure, here is the implementation:

```python
def add_numbers(a, b):
    """Adds two numbers together."""
    return a + b
```
"#;

fn test_config() -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.max_retries = 1;
    config.backoff_base = Duration::from_millis(1);
    config.template_dir = None;
    config
}

#[tokio::test]
async fn test_full_generation_produces_runnable_package_layout() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_response(MockCompletion::text(ADD_NUMBERS_COMPLETION));
    let project = parse_project(ADD_NUMBERS_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client.clone(), test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    assert!(outcome.report.is_complete_success());
    assert_eq!(outcome.report.targets.len(), 1);
    assert_eq!(client.call_count(), 1);

    // logic extracted from the fenced block, dedented, trailing newline
    let logic = outcome.plan.get("functions/add_numbers.py").unwrap();
    assert!(logic.content.starts_with("def add_numbers(a, b):"));
    assert!(logic.content.ends_with('\n'));
    assert!(!logic.content.contains("```"));
    assert!(logic.validation.as_ref().unwrap().is_valid);

    // interface artifact namespaced by kind and valid for the language
    let server = outcome.plan.get("rest/add_numbers_server.py").unwrap();
    assert!(server.content.contains("@app.post(\"/add_numbers\")"));
    assert!(server.validation.as_ref().unwrap().is_valid);

    // example-derived tests, docs, and manifest round out the package
    let tests = outcome.plan.get("tests/test_add_numbers.py").unwrap();
    assert!(tests.content.contains("test_add_numbers_example_1"));
    assert!(tests.content.contains("test_add_numbers_example_2"));

    let readme = outcome.plan.get("README.md").unwrap();
    assert!(readme.content.contains("# calculator"));
    assert!(readme.content.contains("`add_numbers`"));

    let manifest = outcome.plan.get("requirements.txt").unwrap();
    assert!(manifest.content.contains("numpy"));
    assert!(manifest.content.contains("fastapi"));
}

#[tokio::test]
async fn test_materialized_package_matches_the_plan() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_response(MockCompletion::text(ADD_NUMBERS_COMPLETION));
    let project = parse_project(ADD_NUMBERS_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client, test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    let tmp = TempDir::new().unwrap();
    let written = outcome.plan.materialize(tmp.path()).unwrap();
    assert_eq!(written.len(), outcome.plan.len());

    let logic = std::fs::read_to_string(tmp.path().join("functions/add_numbers.py")).unwrap();
    assert!(logic.contains("return a + b"));
    assert!(tmp.path().join("rest/add_numbers_server.py").is_file());
    assert!(tmp.path().join("tests/test_add_numbers.py").is_file());
    assert!(tmp.path().join("README.md").is_file());
}

#[tokio::test]
async fn test_multiple_interfaces_share_one_completion() {
    let spec = ADD_NUMBERS_SPEC.replace("interfaces: [rest]", "interfaces: [rest, cli]");
    let client = Arc::new(MockCompletionClient::new());
    client.add_response(MockCompletion::text(ADD_NUMBERS_COMPLETION));
    let project = parse_project(&spec).unwrap();

    let orchestrator = Orchestrator::new(client.clone(), test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    assert_eq!(outcome.report.targets.len(), 2);
    assert!(outcome.report.is_complete_success());
    assert_eq!(client.call_count(), 1);
    assert!(outcome.plan.get("rest/add_numbers_server.py").is_some());
    assert!(outcome.plan.get("cli/add_numbers_cli.py").is_some());
    // the shared logic exists exactly once
    assert!(outcome.plan.get("functions/add_numbers.py").is_some());
}

#[tokio::test]
async fn test_unknown_interface_is_rejected_at_parse_time() {
    let spec = ADD_NUMBERS_SPEC.replace("interfaces: [rest]", "interfaces: [carrier-pigeon]");
    let err = parse_project(&spec).unwrap_err();
    assert!(matches!(err, SpecFormatError::Syntax(_)));
}

#[tokio::test]
async fn test_unservable_interface_fails_preflight_without_llm_calls() {
    let spec = ADD_NUMBERS_SPEC.replace("language: python", "language: rust");
    let client = Arc::new(MockCompletionClient::new());
    client.add_response(MockCompletion::text(ADD_NUMBERS_COMPLETION));
    let project = parse_project(&spec).unwrap();

    let orchestrator = Orchestrator::new(client.clone(), test_config());
    let err = orchestrator.run(&project).await.unwrap_err();
    assert!(matches!(err, SpecFormatError::UnresolvableInterface { .. }));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_dirty_completion_without_code_block_fails_synthesis() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_response(MockCompletion::text(
        "I would be happy to help, but I need more context.",
    ));
    let project = parse_project(ADD_NUMBERS_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client.clone(), test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    // a well-formed reply with no code block is not a transport failure,
    // so it is not retried; the target fails at synthesis
    assert_eq!(client.call_count(), 1);
    assert_eq!(outcome.report.failed_count(), 1);
    assert!(outcome.plan.is_empty());
    let target = &outcome.report.targets[0];
    assert!(!target.errors.is_empty());
}
