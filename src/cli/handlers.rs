//! Subcommand handlers; each returns the process exit code
//!
//! Exit codes: 0 for success (including tolerated partial success), 1 for
//! generation failures, 2 for spec or configuration errors.

use crate::cli::commands::{CheckArgs, GenerateArgs, OutputFormatArg, TemplatesArgs};
use crate::cli::output::{render_report, render_templates};
use crate::config::GenerationConfig;
use crate::interfaces::InterfaceRegistry;
use crate::llm::{CompletionClient, GenAiClient};
use crate::pipeline::{preflight, Orchestrator};
use crate::spec::{parse_project, ProjectSpec};
use crate::templates::TemplateRegistry;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn handle_generate(args: &GenerateArgs) -> i32 {
    let project = match load_spec(&args.spec_path) {
        Ok(project) => project,
        Err(code) => return code,
    };

    let mut config = GenerationConfig::default();
    if let Some(backend) = args.backend {
        config.provider = backend;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(template_dir) = &args.template_dir {
        config.template_dir = Some(template_dir.clone());
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    config.security_as_warning |= args.security_as_warning;
    config.tolerate_partial |= args.tolerate_partial;
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return 2;
    }
    debug!(
        provider = config.provider.as_str(),
        model = %config.model,
        "backend configured"
    );

    let client: Arc<dyn CompletionClient> = Arc::new(GenAiClient::new(
        config.provider,
        config.model.clone(),
        config.request_timeout,
    ));

    let output_dir = output_dir(&config, &project, args.output.as_deref());
    let orchestrator = Orchestrator::new(client, config.clone());
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let mut outcome = match orchestrator.run(&project).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Invalid spec: {e}");
            return 2;
        }
    };

    if !args.dry_run && outcome.report.is_partial_success() {
        match outcome.plan.materialize(&output_dir) {
            Ok(_) => outcome.report.output_dir = Some(output_dir),
            Err(e) => {
                eprintln!("Failed to write package: {e}");
                return 1;
            }
        }
    }

    match render_report(&outcome.report, args.format) {
        Ok(text) => print!("{text}"),
        Err(e) => eprintln!("Failed to render report: {e}"),
    }

    if outcome.report.is_complete_success() {
        0
    } else if config.tolerate_partial && outcome.report.is_partial_success() {
        0
    } else {
        1
    }
}

pub async fn handle_check(args: &CheckArgs) -> i32 {
    let project = match load_spec(&args.spec_path) {
        Ok(project) => project,
        Err(code) => return code,
    };

    let templates =
        TemplateRegistry::with_dirs(args.template_dir.clone(), GenerationConfig::user_template_dir());
    let interfaces = InterfaceRegistry::standard();
    if let Err(e) = preflight(&project, &templates, &interfaces) {
        eprintln!("Invalid spec: {e}");
        return 2;
    }

    let targets: usize = project
        .functions
        .iter()
        .map(|f| project.effective_interfaces(f).len())
        .sum();
    match args.format {
        OutputFormatArg::Json => {
            let value = json!({
                "valid": true,
                "project": project.name,
                "language": project.language.as_str(),
                "functions": project.functions.len(),
                "targets": targets,
            });
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputFormatArg::Human => {
            println!(
                "spec OK: project '{}' ({}), {} function(s), {} target(s)",
                project.name,
                project.language,
                project.functions.len(),
                targets,
            );
        }
    }
    0
}

pub async fn handle_templates(args: &TemplatesArgs) -> i32 {
    let registry =
        TemplateRegistry::with_dirs(args.template_dir.clone(), GenerationConfig::user_template_dir());
    let discovered = registry.discover();
    match render_templates(&discovered, args.format) {
        Ok(text) => {
            print!("{text}");
            0
        }
        Err(e) => {
            eprintln!("Failed to render template list: {e}");
            2
        }
    }
}

fn load_spec(path: &Path) -> Result<ProjectSpec, i32> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Cannot read spec '{}': {e}", path.display());
            return Err(2);
        }
    };
    parse_project(&raw).map_err(|e| {
        eprintln!("Invalid spec: {e}");
        2
    })
}

/// `-o DIR` is used verbatim; otherwise packages land under the configured
/// output root, one directory per project
fn output_dir(config: &GenerationConfig, project: &ProjectSpec, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => config.output_dir.join(&project.name),
    }
}
