//! Failure isolation: one bad target never aborts the rest of the run

use specforge::config::GenerationConfig;
use specforge::llm::{CompletionError, MockCompletion, MockCompletionClient};
use specforge::pipeline::{Orchestrator, Stage};
use specforge::spec::parse_project;
use std::sync::Arc;
use std::time::Duration;

const TWO_FUNCTION_SPEC: &str = r#"
name: toolbox
language: python
interfaces: [rest]
functions:
  - name: add_numbers
    description: Adds two numbers
    parameters:
      - {name: a, type: integer}
      - {name: b, type: integer}
    output_type: integer
  - name: shout
    description: Upper-cases a string
    parameters:
      - {name: text, type: string}
    output_type: string
"#;

const ADD_LOGIC: &str = "```python\ndef add_numbers(a, b):\n    return a + b\n```";
const SHOUT_LOGIC: &str = "```python\ndef shout(text):\n    return text.upper()\n```";

fn test_config() -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.max_retries = 0;
    config.backoff_base = Duration::from_millis(1);
    config.max_concurrency = 1;
    config.template_dir = None;
    config
}

#[tokio::test]
async fn test_one_exhausted_function_leaves_the_other_assembled() {
    let client = Arc::new(MockCompletionClient::new());
    // concurrency 1 keeps dispatch in declaration order, so the first
    // response goes to add_numbers and the error to shout
    client.add_responses([
        MockCompletion::text(ADD_LOGIC),
        MockCompletion::error(CompletionError::Network("connection reset".to_string())),
    ]);
    let project = parse_project(TWO_FUNCTION_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client, test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    assert_eq!(outcome.report.targets.len(), 2);
    assert_eq!(outcome.report.assembled_count(), 1);
    assert_eq!(outcome.report.failed_count(), 1);

    let failed = outcome
        .report
        .targets
        .iter()
        .find(|t| !t.assembled)
        .unwrap();
    assert_eq!(failed.function, "shout");
    assert_eq!(failed.language, "python");
    assert_eq!(failed.interface, "rest");
    assert_eq!(failed.failed_stage, Some(Stage::Synthesis));
    assert!(failed.errors.iter().any(|e| e.contains("connection reset")));

    // the healthy function's artifacts are all present
    assert!(outcome.plan.get("functions/add_numbers.py").is_some());
    assert!(outcome.plan.get("rest/add_numbers_server.py").is_some());
    assert!(outcome.plan.get("functions/shout.py").is_none());
    assert!(outcome.plan.get("rest/shout_server.py").is_none());
}

#[tokio::test]
async fn test_retry_exhaustion_reports_total_attempts() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_responses([
        MockCompletion::error(CompletionError::Timeout { seconds: 1 }),
        MockCompletion::error(CompletionError::Timeout { seconds: 1 }),
        MockCompletion::error(CompletionError::Timeout { seconds: 1 }),
        MockCompletion::text(SHOUT_LOGIC),
    ]);
    let spec = TWO_FUNCTION_SPEC
        .lines()
        .take_while(|line| !line.contains("- name: shout"))
        .collect::<Vec<_>>()
        .join("\n");
    let project = parse_project(&spec).unwrap();

    let mut config = test_config();
    config.max_retries = 2;
    let orchestrator = Orchestrator::new(client.clone(), config);
    let outcome = orchestrator.run(&project).await.unwrap();

    // initial try plus two retries, then the gateway gives up
    assert_eq!(client.call_count(), 3);
    assert_eq!(outcome.report.failed_count(), 1);
    assert_eq!(outcome.report.targets[0].completion_attempts, 3);
}

#[tokio::test]
async fn test_both_functions_assemble_and_share_project_scaffolding() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_responses([
        MockCompletion::text(ADD_LOGIC),
        MockCompletion::text(SHOUT_LOGIC),
    ]);
    let project = parse_project(TWO_FUNCTION_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client, test_config());
    let outcome = orchestrator.run(&project).await.unwrap();

    assert!(outcome.report.is_complete_success());
    assert!(outcome.plan.get("functions/add_numbers.py").is_some());
    assert!(outcome.plan.get("functions/shout.py").is_some());
    assert!(outcome.plan.get("tests/test_add_numbers.py").is_some());
    assert!(outcome.plan.get("tests/test_shout.py").is_some());

    // README and the manifest are project-wide: one of each, covering
    // every function
    let readme = outcome.plan.get("README.md").unwrap();
    assert!(readme.content.contains("`add_numbers`"));
    assert!(readme.content.contains("`shout`"));
    let count = outcome
        .plan
        .files()
        .filter(|(path, _)| path.to_string_lossy().contains("README"))
        .count();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_cancellation_skips_unstarted_functions() {
    let client = Arc::new(MockCompletionClient::new());
    client.add_responses([
        MockCompletion::text(ADD_LOGIC),
        MockCompletion::text(SHOUT_LOGIC),
    ]);
    let project = parse_project(TWO_FUNCTION_SPEC).unwrap();

    let orchestrator = Orchestrator::new(client.clone(), test_config());
    orchestrator.cancellation_token().cancel();
    let outcome = orchestrator.run(&project).await.unwrap();

    assert_eq!(client.call_count(), 0);
    assert_eq!(outcome.report.failed_count(), 2);
    assert!(outcome.plan.is_empty());
}
