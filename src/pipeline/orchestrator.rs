//! Fan-out orchestration over (function, language, interface) targets
//!
//! Logic synthesis runs once per function and is shared by every interface
//! target of that function; synthesis tasks run concurrently under a
//! semaphore, higher-priority functions are dispatched first. Rendering,
//! validation, and assembly then proceed in declaration order so the
//! package plan is deterministic for a given spec and completion outcome.
//! A failed target never aborts the run; every failure is isolated and
//! reported per target.

use super::report::{RunReport, Stage, TargetOutcome};
use crate::artifact::{ArtifactKind, ArtifactSource, GeneratedArtifact, GenerationTarget};
use crate::assemble::PackagePlan;
use crate::config::GenerationConfig;
use crate::interfaces::{project_context, InterfaceError, InterfaceRegistry, RenderContext};
use crate::llm::{extract_code, CompletionClient, CompletionGateway};
use crate::spec::{FunctionSpec, InterfaceKind, Language, ProjectSpec, SpecFormatError};
use crate::templates::{TemplateCategory, TemplateKey, TemplateRegistry};
use crate::validation::Validator;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a full generation run: the report plus the package plan.
/// The plan is only worth materializing when the report shows assembled
/// targets; writing it is the caller's decision (dry runs skip it).
#[derive(Debug)]
pub struct GenerationOutcome {
    pub report: RunReport,
    pub plan: PackagePlan,
}

/// Per-function synthesis result shared across that function's targets
struct SynthesizedLogic {
    result: Result<String, (Stage, String)>,
    attempts: u32,
    elapsed: Duration,
}

pub struct Orchestrator {
    config: GenerationConfig,
    templates: Arc<TemplateRegistry>,
    interfaces: InterfaceRegistry,
    gateway: CompletionGateway,
    validator: Validator,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, config: GenerationConfig) -> Self {
        let templates = Arc::new(TemplateRegistry::new(&config));
        let gateway = CompletionGateway::new(client, &config);
        let validator = Validator::new(config.security_as_warning);
        Self {
            config,
            templates,
            interfaces: InterfaceRegistry::standard(),
            gateway,
            validator,
            cancel: CancellationToken::new(),
        }
    }

    /// Token observers can trigger to stop the run; no new completion
    /// calls are made after cancellation, finished targets stay finished.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn template_registry(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Rejects specs naming an interface that no generator or template
    /// bundle can serve for the project language. Runs before any
    /// completion call is made.
    pub fn preflight(&self, project: &ProjectSpec) -> Result<(), SpecFormatError> {
        preflight(project, &self.templates, &self.interfaces)
    }

    pub async fn run(&self, project: &ProjectSpec) -> Result<GenerationOutcome, SpecFormatError> {
        let started = Utc::now();
        self.preflight(project)?;
        info!(
            project = %project.name,
            language = %project.language,
            functions = project.functions.len(),
            "starting generation run"
        );

        let synthesized = self.synthesize_all(project).await;

        let mut plan = PackagePlan::new(self.config.collision);
        let mut outcomes = Vec::new();
        let mut logic_inserted: HashSet<String> = HashSet::new();

        for (idx, function) in project.functions.iter().enumerate() {
            let logic = &synthesized[&idx];
            for interface in project.effective_interfaces(function) {
                let target = GenerationTarget {
                    function: function.name.clone(),
                    language: project.language,
                    interface: interface.kind,
                };
                let outcome = self.finish_target(
                    project,
                    function,
                    interface,
                    &target,
                    logic,
                    &mut plan,
                    &mut logic_inserted,
                );
                match &outcome.failed_stage {
                    Some(stage) => warn!(target = %target, stage = ?stage, "target failed"),
                    None => debug!(target = %target, "target assembled"),
                }
                outcomes.push(outcome);
            }
        }

        let report = RunReport::new(&project.name, started, outcomes);
        info!(
            assembled = report.assembled_count(),
            failed = report.failed_count(),
            "generation run finished"
        );
        Ok(GenerationOutcome { report, plan })
    }

    /// Runs logic synthesis concurrently, one task per function, bounded
    /// by the configured concurrency. Higher-priority functions are
    /// dispatched first.
    async fn synthesize_all(&self, project: &ProjectSpec) -> HashMap<usize, SynthesizedLogic> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut order: Vec<usize> = (0..project.functions.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(project.functions[i].priority));

        let mut join = JoinSet::new();
        for idx in order {
            let function = project.functions[idx].clone();
            let language = project.language;
            let gateway = self.gateway.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            join.spawn(async move {
                let started = Instant::now();
                let logic =
                    synthesize_one(&gateway, &function, language, &semaphore, &cancel, started)
                        .await;
                (idx, logic)
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = join.join_next().await {
            match joined {
                Ok((idx, logic)) => {
                    results.insert(idx, logic);
                }
                Err(e) => warn!(error = %e, "synthesis task panicked"),
            }
        }
        // a panicked task leaves a hole; fill it so every target reports
        for idx in 0..project.functions.len() {
            results.entry(idx).or_insert_with(|| SynthesizedLogic {
                result: Err((Stage::Synthesis, "synthesis task aborted".to_string())),
                attempts: 0,
                elapsed: Duration::ZERO,
            });
        }
        results
    }

    /// Renders, validates, and assembles one target from its shared logic
    #[allow(clippy::too_many_arguments)]
    fn finish_target(
        &self,
        project: &ProjectSpec,
        function: &FunctionSpec,
        interface: &crate::spec::InterfaceSpec,
        target: &GenerationTarget,
        logic: &SynthesizedLogic,
        plan: &mut PackagePlan,
        logic_inserted: &mut HashSet<String>,
    ) -> TargetOutcome {
        let started = Instant::now();
        let elapsed = |started: Instant| logic.elapsed + started.elapsed();

        let code = match &logic.result {
            Ok(code) => code,
            Err((stage, error)) => {
                return TargetOutcome::failed(
                    target,
                    *stage,
                    vec![error.clone()],
                    Vec::new(),
                    elapsed(started),
                    logic.attempts,
                );
            }
        };
        if self.cancel.is_cancelled() {
            return TargetOutcome::failed(
                target,
                Stage::Rendering,
                vec!["run cancelled".to_string()],
                Vec::new(),
                elapsed(started),
                logic.attempts,
            );
        }

        let mut artifacts = vec![GeneratedArtifact::new(
            target.clone(),
            ArtifactKind::Logic,
            format!(
                "functions/{}.{}",
                function.name,
                target.language.source_extension()
            ),
            code.clone(),
            ArtifactSource::Llm,
        )];

        let generator = match self.interfaces.get(interface.kind) {
            Some(generator) => generator,
            None => {
                return TargetOutcome::failed(
                    target,
                    Stage::Templates,
                    vec![format!("no generator for interface '{}'", interface.kind)],
                    Vec::new(),
                    elapsed(started),
                    logic.attempts,
                );
            }
        };
        let ctx = RenderContext {
            project,
            function,
            interface,
            target,
        };
        match generator.render(&self.templates, &ctx) {
            Ok(rendered) => artifacts.extend(rendered),
            Err(e) => {
                // A bundle that fails to resolve is a template-stage
                // failure; only an actual render error counts as rendering.
                let stage = match e {
                    InterfaceError::Template(_) => Stage::Templates,
                    InterfaceError::Render(_) => Stage::Rendering,
                };
                return TargetOutcome::failed(
                    target,
                    stage,
                    vec![e.to_string()],
                    Vec::new(),
                    elapsed(started),
                    logic.attempts,
                );
            }
        }

        let mut warnings = Vec::new();
        match self.render_scaffolding(project, function, target) {
            Ok(rendered) => artifacts.extend(rendered),
            // scaffolding is best-effort: a missing test or manifest
            // bundle degrades the package, it does not fail the target
            Err(message) => warnings.push(message),
        }

        let mut errors = Vec::new();
        for artifact in &mut artifacts {
            let result = self.validator.validate(artifact);
            warnings.extend(result.warnings.iter().map(|f| f.to_string()));
            if result.has_fatal() {
                errors.extend(result.errors.iter().map(|f| f.to_string()));
            }
            artifact.validation = Some(result);
        }
        if !errors.is_empty() {
            return TargetOutcome::failed(
                target,
                Stage::Validation,
                errors,
                warnings,
                elapsed(started),
                logic.attempts,
            );
        }

        for artifact in artifacts {
            if artifact.kind == ArtifactKind::Logic {
                if logic_inserted.contains(&function.name) {
                    continue;
                }
                logic_inserted.insert(function.name.clone());
            }
            if let Err(e) = plan.insert(artifact) {
                return TargetOutcome::failed(
                    target,
                    Stage::Assembly,
                    vec![e.to_string()],
                    warnings,
                    elapsed(started),
                    logic.attempts,
                );
            }
        }

        TargetOutcome::assembled(target, warnings, elapsed(started), logic.attempts)
    }

    /// Test, docs, and manifest artifacts for a target. Docs and manifest
    /// content is project-wide, so duplicates across targets collapse
    /// under the overwrite policy.
    fn render_scaffolding(
        &self,
        project: &ProjectSpec,
        function: &FunctionSpec,
        target: &GenerationTarget,
    ) -> Result<Vec<GeneratedArtifact>, String> {
        let mut artifacts = Vec::new();

        let test_key = TemplateKey::plain(TemplateCategory::Test, target.language);
        match self.templates.resolve(test_key) {
            Ok(bundle) => {
                let context = json!({
                    "project": project_context(project),
                    "function": function,
                });
                for source in &bundle.sources {
                    let content = self
                        .templates
                        .render(source, &context)
                        .map_err(|e| e.to_string())?;
                    let file_name = source.file_name.replace("{function}", &function.name);
                    artifacts.push(GeneratedArtifact::new(
                        target.clone(),
                        ArtifactKind::Test,
                        format!("tests/{file_name}"),
                        content,
                        ArtifactSource::Template,
                    ));
                }
            }
            Err(e) => return Err(e.to_string()),
        }

        let docs_key = TemplateKey::plain(TemplateCategory::Docs, target.language);
        if let Ok(bundle) = self.templates.resolve(docs_key) {
            let functions: Vec<serde_json::Value> = project
                .functions
                .iter()
                .map(|f| {
                    let kinds: Vec<&str> = project
                        .effective_interfaces(f)
                        .iter()
                        .map(|i| i.kind.as_str())
                        .collect();
                    json!({
                        "name": f.name,
                        "description": f.description,
                        "parameters": f.parameters,
                        "interfaces": kinds,
                    })
                })
                .collect();
            let context = json!({
                "project": project_context(project),
                "functions": functions,
            });
            for source in &bundle.sources {
                let content = self
                    .templates
                    .render(source, &context)
                    .map_err(|e| e.to_string())?;
                artifacts.push(GeneratedArtifact::new(
                    target.clone(),
                    ArtifactKind::Doc,
                    source.file_name.clone(),
                    content,
                    ArtifactSource::Template,
                ));
            }
        }

        let manifest_key = TemplateKey::plain(TemplateCategory::Project, target.language);
        if let Ok(bundle) = self.templates.resolve(manifest_key) {
            let context = json!({
                "project": project_context(project),
                "dependencies": merged_dependencies(project),
            });
            for source in &bundle.sources {
                let content = self
                    .templates
                    .render(source, &context)
                    .map_err(|e| e.to_string())?;
                artifacts.push(GeneratedArtifact::new(
                    target.clone(),
                    ArtifactKind::Manifest,
                    source.file_name.clone(),
                    content,
                    ArtifactSource::Template,
                ));
            }
        }

        Ok(artifacts)
    }
}

/// Every (function, interface) pair must have both a registered generator
/// and a resolvable template bundle for the project language; a spec that
/// cannot produce all of its targets is rejected whole.
pub fn preflight(
    project: &ProjectSpec,
    templates: &TemplateRegistry,
    interfaces: &InterfaceRegistry,
) -> Result<(), SpecFormatError> {
    for function in &project.functions {
        let requested = project.effective_interfaces(function);
        if requested.is_empty() {
            return Err(SpecFormatError::NoInterfaces(function.name.clone()));
        }
        for interface in requested {
            let supported = interfaces.get(interface.kind).is_some()
                && templates.can_resolve(TemplateKey::interface(project.language, interface.kind));
            if !supported {
                return Err(SpecFormatError::UnresolvableInterface {
                    function: function.name.clone(),
                    interface: interface.kind,
                    language: project.language,
                });
            }
        }
    }
    Ok(())
}

async fn synthesize_one(
    gateway: &CompletionGateway,
    function: &FunctionSpec,
    language: Language,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
    started: Instant,
) -> SynthesizedLogic {
    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return SynthesizedLogic {
                result: Err((Stage::Synthesis, "scheduler shut down".to_string())),
                attempts: 0,
                elapsed: started.elapsed(),
            };
        }
    };
    if cancel.is_cancelled() {
        return SynthesizedLogic {
            result: Err((Stage::Synthesis, "run cancelled".to_string())),
            attempts: 0,
            elapsed: started.elapsed(),
        };
    }

    let raw = tokio::select! {
        _ = cancel.cancelled() => {
            return SynthesizedLogic {
                result: Err((Stage::Synthesis, "run cancelled".to_string())),
                attempts: 0,
                elapsed: started.elapsed(),
            };
        }
        raw = gateway.synthesize(function, language) => raw,
    };
    match raw {
        Ok(raw) => {
            let attempts = raw.attempts;
            let result = extract_code(&raw, language)
                .map_err(|e| (Stage::Synthesis, e.to_string()));
            SynthesizedLogic {
                result,
                attempts,
                elapsed: started.elapsed(),
            }
        }
        Err(e) => SynthesizedLogic {
            result: Err((Stage::Synthesis, e.to_string())),
            attempts: e.attempts,
            elapsed: started.elapsed(),
        },
    }
}

/// Declared dependencies for the project language, merged across all
/// functions, plus the packages the requested interfaces rely on
fn merged_dependencies(project: &ProjectSpec) -> Vec<String> {
    let mut deps = BTreeSet::new();
    let mut kinds = BTreeSet::new();
    for function in &project.functions {
        if let Some(declared) = function.dependencies.get(project.language.as_str()) {
            deps.extend(declared.iter().cloned());
        }
        for interface in project.effective_interfaces(function) {
            kinds.insert(interface.kind);
        }
    }
    for kind in kinds {
        for dep in implied_dependencies(project.language, kind) {
            deps.insert(dep.to_string());
        }
    }
    deps.into_iter().collect()
}

fn implied_dependencies(language: Language, kind: InterfaceKind) -> &'static [&'static str] {
    match (language, kind) {
        (Language::Python, InterfaceKind::Rest) => &["fastapi", "pydantic", "uvicorn"],
        (Language::Python, InterfaceKind::Grpc) => &["grpcio", "grpcio-tools"],
        (Language::JavaScript, InterfaceKind::Rest) => &["express"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockCompletion, MockCompletionClient};
    use crate::spec::parse_project;

    const SPEC: &str = r#"
name: demo
description: Demo project
language: python
interfaces: [rest]
functions:
  - name: add_numbers
    description: Adds two numbers
    parameters:
      - {name: a, type: integer}
      - {name: b, type: integer}
    output_type: integer
    examples:
      - {input: {a: 5, b: 3}, output: 8}
"#;

    const LOGIC: &str = "Here you go:\n```python\ndef add_numbers(a, b):\n    return a + b\n```\n";

    fn orchestrator(client: Arc<MockCompletionClient>) -> Orchestrator {
        let mut config = GenerationConfig::default();
        config.max_retries = 0;
        config.backoff_base = Duration::from_millis(1);
        Orchestrator::new(client, config)
    }

    #[tokio::test]
    async fn test_single_function_rest_run_assembles() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_response(MockCompletion::text(LOGIC));
        let project = parse_project(SPEC).unwrap();

        let outcome = orchestrator(client).run(&project).await.unwrap();
        assert!(outcome.report.is_complete_success());
        assert_eq!(outcome.report.targets.len(), 1);

        let logic = outcome.plan.get("functions/add_numbers.py").unwrap();
        assert!(logic.content.contains("return a + b"));
        assert!(outcome.plan.get("rest/add_numbers_server.py").is_some());
        assert!(outcome.plan.get("tests/test_add_numbers.py").is_some());
        assert!(outcome.plan.get("README.md").is_some());
        let manifest = outcome.plan.get("requirements.txt").unwrap();
        assert!(manifest.content.contains("fastapi"));
    }

    #[tokio::test]
    async fn test_synthesis_shared_across_interfaces_of_a_function() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_response(MockCompletion::text(LOGIC));
        let call_counter = client.clone();
        let mut project = parse_project(SPEC).unwrap();
        project.interfaces = vec![
            crate::spec::InterfaceSpec::new(InterfaceKind::Rest),
            crate::spec::InterfaceSpec::new(InterfaceKind::Cli),
        ];

        let outcome = orchestrator(client).run(&project).await.unwrap();
        assert_eq!(outcome.report.targets.len(), 2);
        assert!(outcome.report.is_complete_success());
        // one completion for the function, not one per interface
        assert_eq!(call_counter.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_interface_fails_before_any_completion() {
        let client = Arc::new(MockCompletionClient::new());
        let call_counter = client.clone();
        let mut project = parse_project(SPEC).unwrap();
        project.language = Language::Go;

        let err = orchestrator(client).run(&project).await.unwrap_err();
        assert!(matches!(err, SpecFormatError::UnresolvableInterface { .. }));
        assert_eq!(call_counter.call_count(), 0);
    }

    #[test]
    fn test_unresolvable_bundle_reports_template_stage() {
        let orch = orchestrator(Arc::new(MockCompletionClient::new()));
        let mut project = parse_project(SPEC).unwrap();
        project.language = Language::Go;

        // Valid logic in hand, but no interface bundle ships for Go; the
        // failure belongs to template resolution, not rendering.
        let function = project.functions[0].clone();
        let interface = function.interfaces[0].clone();
        let target = GenerationTarget {
            function: function.name.clone(),
            language: Language::Go,
            interface: interface.kind,
        };
        let logic = SynthesizedLogic {
            result: Ok("package main\n".to_string()),
            attempts: 1,
            elapsed: Duration::ZERO,
        };
        let mut plan = PackagePlan::new(orch.config.collision);
        let mut inserted = HashSet::new();

        let outcome = orch.finish_target(
            &project,
            &function,
            &interface,
            &target,
            &logic,
            &mut plan,
            &mut inserted,
        );
        assert_eq!(outcome.failed_stage, Some(Stage::Templates));
    }

    #[tokio::test]
    async fn test_invalid_logic_fails_target_at_validation() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_response(MockCompletion::text(
            "```python\nimport os\n\n\ndef add_numbers(a, b):\n    os.system(\"rm x\")\n    return a + b\n```",
        ));
        let project = parse_project(SPEC).unwrap();

        let outcome = orchestrator(client).run(&project).await.unwrap();
        assert_eq!(outcome.report.failed_count(), 1);
        let target = &outcome.report.targets[0];
        assert_eq!(target.failed_stage, Some(Stage::Validation));
        assert!(target.errors.iter().any(|e| e.contains("security")));
        assert!(outcome.plan.is_empty());
    }

    #[tokio::test]
    async fn test_security_downgrade_lets_target_assemble_with_warnings() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_response(MockCompletion::text(
            "```python\nimport os\n\n\ndef add_numbers(a, b):\n    os.system(\"echo hi\")\n    return a + b\n```",
        ));
        let project = parse_project(SPEC).unwrap();
        let mut config = GenerationConfig::default();
        config.max_retries = 0;
        config.security_as_warning = true;
        let orchestrator = Orchestrator::new(client, config);

        let outcome = orchestrator.run(&project).await.unwrap();
        assert!(outcome.report.is_complete_success());
        assert!(outcome.report.targets[0]
            .warnings
            .iter()
            .any(|w| w.contains("security")));
    }

    #[tokio::test]
    async fn test_cancelled_run_makes_no_completion_calls() {
        let client = Arc::new(MockCompletionClient::new());
        client.add_response(MockCompletion::text(LOGIC));
        let call_counter = client.clone();
        let project = parse_project(SPEC).unwrap();

        let orchestrator = orchestrator(client);
        orchestrator.cancellation_token().cancel();
        let outcome = orchestrator.run(&project).await.unwrap();
        assert_eq!(outcome.report.failed_count(), 1);
        assert_eq!(call_counter.call_count(), 0);
    }
}
