//! Report formatting for the CLI: human-readable text or JSON

use crate::cli::commands::OutputFormatArg;
use crate::pipeline::RunReport;
use crate::templates::DiscoveredTemplate;
use anyhow::{Context, Result};
use std::fmt::Write;

pub fn render_report(report: &RunReport, format: OutputFormatArg) -> Result<String> {
    match format {
        OutputFormatArg::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize run report")
        }
        OutputFormatArg::Human => Ok(render_report_human(report)),
    }
}

fn render_report_human(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "run {} ({})", report.run_id, report.project);
    for target in &report.targets {
        let marker = if target.assembled { "ok  " } else { "FAIL" };
        let _ = write!(
            out,
            "  {marker} {}/{}/{} ({}ms, {} attempt{})",
            target.function,
            target.language,
            target.interface,
            target.elapsed_ms,
            target.completion_attempts,
            if target.completion_attempts == 1 { "" } else { "s" },
        );
        if let Some(stage) = &target.failed_stage {
            let _ = write!(out, " failed at {stage:?}");
        }
        let _ = writeln!(out);
        for error in &target.errors {
            let _ = writeln!(out, "        error: {error}");
        }
        for warning in &target.warnings {
            let _ = writeln!(out, "        warning: {warning}");
        }
    }
    let _ = writeln!(
        out,
        "{} assembled, {} failed",
        report.assembled_count(),
        report.failed_count()
    );
    if let Some(dir) = &report.output_dir {
        let _ = writeln!(out, "package written to {}", dir.display());
    }
    out
}

pub fn render_templates(templates: &[DiscoveredTemplate], format: OutputFormatArg) -> Result<String> {
    match format {
        OutputFormatArg::Json => {
            serde_json::to_string_pretty(templates).context("failed to serialize template list")
        }
        OutputFormatArg::Human => {
            let mut out = String::new();
            for template in templates {
                let _ = writeln!(
                    out,
                    "{:<28} {:<14} [{}]",
                    template.key.to_string(),
                    template.origin.as_str(),
                    template.sources.join(", "),
                );
            }
            let _ = writeln!(out, "{} bundle(s) resolvable", templates.len());
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::GenerationTarget;
    use crate::pipeline::{Stage, TargetOutcome};
    use crate::spec::{InterfaceKind, Language};
    use chrono::Utc;
    use std::time::Duration;

    fn report() -> RunReport {
        let target = GenerationTarget {
            function: "add_numbers".into(),
            language: Language::Python,
            interface: InterfaceKind::Rest,
        };
        RunReport::new(
            "demo",
            Utc::now(),
            vec![
                TargetOutcome::assembled(&target, vec![], Duration::from_millis(12), 1),
                TargetOutcome::failed(
                    &target,
                    Stage::Synthesis,
                    vec!["completion unavailable".into()],
                    vec![],
                    Duration::from_millis(3),
                    3,
                ),
            ],
        )
    }

    #[test]
    fn test_human_report_lists_targets_and_counts() {
        let text = render_report(&report(), OutputFormatArg::Human).unwrap();
        assert!(text.contains("ok   add_numbers/python/rest"));
        assert!(text.contains("FAIL add_numbers/python/rest"));
        assert!(text.contains("1 assembled, 1 failed"));
        assert!(text.contains("error: completion unavailable"));
    }

    #[test]
    fn test_json_report_is_valid_json() {
        let text = render_report(&report(), OutputFormatArg::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["project"], "demo");
        assert_eq!(value["targets"].as_array().unwrap().len(), 2);
    }
}
