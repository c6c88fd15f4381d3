use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// Spec-driven package generator with LLM-synthesized function logic
#[derive(Parser, Debug)]
#[command(
    name = "specforge",
    about = "Generates runnable software packages from declarative function specs",
    version,
    author,
    long_about = "specforge reads a YAML/JSON function specification, synthesizes the \
                  function bodies with an LLM backend (Ollama, OpenAI, Claude, Gemini, \
                  Grok, Groq), renders serving interfaces from templates, validates the \
                  result, and assembles everything into a runnable package."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate a package from a spec",
        long_about = "Parses the specification, synthesizes function logic, renders \
                      interfaces, validates every artifact, and writes the package.\n\n\
                      Examples:\n  \
                      specforge generate spec.yaml\n  \
                      specforge generate spec.yaml -o build/demo --format json\n  \
                      specforge generate spec.yaml --backend ollama --model qwen2.5-coder\n  \
                      specforge generate spec.yaml --dry-run"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Validate a spec without calling any LLM backend",
        long_about = "Parses and validates the specification, including whether every \
                      requested interface can be served for the target language.\n\n\
                      Examples:\n  \
                      specforge check spec.yaml\n  \
                      specforge check spec.yaml --format json"
    )]
    Check(CheckArgs),

    #[command(
        about = "List the template bundles the registry can resolve",
        long_about = "Walks built-in, user-level, and project-local templates and prints \
                      every resolvable bundle with its origin.\n\n\
                      Examples:\n  \
                      specforge templates\n  \
                      specforge templates --template-dir ./templates"
    )]
    Templates(TemplatesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(value_name = "SPEC", help = "Path to the spec file (YAML or JSON)")]
    pub spec_path: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Output directory for the generated package"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Report output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'b',
        long,
        value_parser = parse_backend,
        help = "LLM backend provider (defaults to SPECFORGE_PROVIDER or ollama)"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(short = 'm', long, help = "Model name for the backend")]
    pub model: Option<String>,

    #[arg(long, value_name = "N", help = "Completion retries per function")]
    pub max_retries: Option<u32>,

    #[arg(
        long,
        value_name = "N",
        help = "Maximum concurrent completion requests"
    )]
    pub concurrency: Option<usize>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Project-local template override directory"
    )]
    pub template_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Downgrade security findings to warnings instead of failing the target"
    )]
    pub security_as_warning: bool,

    #[arg(
        long,
        help = "Exit successfully when at least one target assembled"
    )]
    pub tolerate_partial: bool,

    #[arg(long, help = "Run the whole pipeline but write nothing to disk")]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[arg(value_name = "SPEC", help = "Path to the spec file (YAML or JSON)")]
    pub spec_path: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        value_name = "DIR",
        help = "Project-local template override directory"
    )]
    pub template_dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct TemplatesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        value_name = "DIR",
        help = "Project-local template override directory"
    )]
    pub template_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
}

fn parse_backend(raw: &str) -> Result<AdapterKind, String> {
    crate::config::parse_provider(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args_parse() {
        let args = CliArgs::parse_from([
            "specforge",
            "generate",
            "spec.yaml",
            "-o",
            "out",
            "--backend",
            "ollama",
            "--dry-run",
        ]);
        match args.command {
            Commands::Generate(generate) => {
                assert_eq!(generate.spec_path, PathBuf::from("spec.yaml"));
                assert_eq!(generate.output, Some(PathBuf::from("out")));
                assert_eq!(generate.backend, Some(AdapterKind::Ollama));
                assert!(generate.dry_run);
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_claude_alias_maps_to_anthropic() {
        let args = CliArgs::parse_from(["specforge", "generate", "spec.yaml", "-b", "claude"]);
        match args.command {
            Commands::Generate(generate) => {
                assert_eq!(generate.backend, Some(AdapterKind::Anthropic));
            }
            _ => panic!("expected generate subcommand"),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = CliArgs::try_parse_from(["specforge", "generate", "spec.yaml", "-b", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_and_templates_parse() {
        let args = CliArgs::parse_from(["specforge", "check", "spec.yaml", "--format", "json"]);
        assert!(matches!(args.command, Commands::Check(_)));

        let args = CliArgs::parse_from(["specforge", "templates"]);
        assert!(matches!(args.command, Commands::Templates(_)));
    }
}
