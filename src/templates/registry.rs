//! Bundle resolution with precedence, caching, and single-flight

use super::{
    build_environment, RenderError, TemplateBundle, TemplateCategory, TemplateKey,
    TemplateNotFoundError, TemplateSource,
};
use crate::config::GenerationConfig;
use crate::spec::{InterfaceKind, Language};
use minijinja::Environment;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

/// Where a resolved bundle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateOrigin {
    ProjectLocal,
    UserLevel,
    Builtin,
}

impl TemplateOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateOrigin::ProjectLocal => "project-local",
            TemplateOrigin::UserLevel => "user-level",
            TemplateOrigin::Builtin => "builtin",
        }
    }
}

/// A key the registry can resolve, for listing
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredTemplate {
    pub key: TemplateKey,
    pub origin: TemplateOrigin,
    pub sources: Vec<String>,
}

struct EmbeddedBundle {
    category: TemplateCategory,
    /// `None` matches any language
    language: Option<Language>,
    interface: Option<InterfaceKind>,
    /// (name, output file name pattern, body)
    sources: &'static [(&'static str, &'static str, &'static str)],
}

static EMBEDDED: &[EmbeddedBundle] = &[
    EmbeddedBundle {
        category: TemplateCategory::Interface,
        language: Some(Language::Python),
        interface: Some(InterfaceKind::Rest),
        sources: &[(
            "server",
            "{function}_server.py",
            include_str!("../../templates/interface/rest_python.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Interface,
        language: Some(Language::JavaScript),
        interface: Some(InterfaceKind::Rest),
        sources: &[(
            "server",
            "{function}_server.js",
            include_str!("../../templates/interface/rest_javascript.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Interface,
        language: Some(Language::Python),
        interface: Some(InterfaceKind::Grpc),
        sources: &[
            (
                "proto",
                "{function}.proto",
                include_str!("../../templates/interface/grpc_proto.jinja"),
            ),
            (
                "server",
                "{function}_server.py",
                include_str!("../../templates/interface/grpc_python.jinja"),
            ),
        ],
    },
    EmbeddedBundle {
        category: TemplateCategory::Interface,
        language: Some(Language::Python),
        interface: Some(InterfaceKind::Cli),
        sources: &[(
            "cli",
            "{function}_cli.py",
            include_str!("../../templates/interface/cli_python.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Interface,
        language: Some(Language::JavaScript),
        interface: Some(InterfaceKind::Cli),
        sources: &[(
            "cli",
            "{function}_cli.js",
            include_str!("../../templates/interface/cli_javascript.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Test,
        language: Some(Language::Python),
        interface: None,
        sources: &[(
            "test",
            "test_{function}.py",
            include_str!("../../templates/test_python.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Test,
        language: Some(Language::JavaScript),
        interface: None,
        sources: &[(
            "test",
            "{function}.test.js",
            include_str!("../../templates/test_javascript.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Docs,
        language: None,
        interface: None,
        sources: &[(
            "readme",
            "README.md",
            include_str!("../../templates/docs_readme.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Project,
        language: Some(Language::Python),
        interface: None,
        sources: &[(
            "manifest",
            "requirements.txt",
            include_str!("../../templates/project_python.jinja"),
        )],
    },
    EmbeddedBundle {
        category: TemplateCategory::Project,
        language: Some(Language::JavaScript),
        interface: None,
        sources: &[(
            "manifest",
            "package.json",
            include_str!("../../templates/project_javascript.jinja"),
        )],
    },
];

/// Context variables each category's templates are rendered with
fn category_context(category: TemplateCategory) -> Vec<String> {
    let names: &[&str] = match category {
        TemplateCategory::Interface => &["project", "function", "interface"],
        TemplateCategory::Test => &["project", "function"],
        TemplateCategory::Docs => &["project", "functions"],
        TemplateCategory::Project => &["project", "dependencies"],
    };
    names.iter().map(|n| n.to_string()).collect()
}

/// Output file name used when an override is a single `.jinja` file and
/// carries no name of its own
fn default_file_name(key: &TemplateKey) -> String {
    let ext = key.language.source_extension();
    match key.category {
        TemplateCategory::Interface => format!("{{function}}_server.{ext}"),
        TemplateCategory::Test => format!("test_{{function}}.{ext}"),
        TemplateCategory::Docs => "README.md".to_string(),
        TemplateCategory::Project => match key.language {
            Language::Python => "requirements.txt".to_string(),
            Language::JavaScript => "package.json".to_string(),
            Language::Go => "go.mod".to_string(),
            Language::Rust => "Cargo.toml".to_string(),
        },
    }
}

type CachedResolution = Result<Arc<TemplateBundle>, TemplateNotFoundError>;
type CacheCell = Arc<OnceLock<CachedResolution>>;

/// Resolves and caches template bundles, and renders their sources.
///
/// Each cached entry carries a fingerprint of the override files that could
/// satisfy its key, so editing an override between resolutions is picked
/// up while unchanged lookups stay cached, including failed ones. A changed
/// fingerprint replaces the entry; one entry per key, stale resolutions
/// never accumulate.
pub struct TemplateRegistry {
    env: Environment<'static>,
    project_dir: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    cache: Mutex<HashMap<TemplateKey, (String, CacheCell)>>,
}

impl TemplateRegistry {
    pub fn new(config: &GenerationConfig) -> Self {
        Self::with_dirs(
            config.template_dir.clone(),
            GenerationConfig::user_template_dir(),
        )
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            env: build_environment(),
            project_dir,
            user_dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `key` to its bundle, walking project-local overrides, then
    /// user-level templates, then the built-ins. The first level with a
    /// match wins; within a level an exact language match beats a
    /// language-generic one.
    pub fn resolve(&self, key: TemplateKey) -> CachedResolution {
        let fingerprint = self.override_fingerprint(&key);
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            match cache.get(&key) {
                Some((cached, cell)) if *cached == fingerprint => cell.clone(),
                _ => {
                    let cell: CacheCell = Arc::new(OnceLock::new());
                    cache.insert(key, (fingerprint, cell.clone()));
                    cell
                }
            }
        };
        // OnceLock serializes concurrent initializers for the same key
        cell.get_or_init(|| {
            let resolved = self.resolve_uncached(&key);
            match &resolved {
                Ok(bundle) => debug!(key = %key, origin = bundle.origin.as_str(), "resolved template bundle"),
                Err(_) => debug!(key = %key, "no template bundle found"),
            }
            resolved
        })
        .clone()
    }

    pub fn can_resolve(&self, key: TemplateKey) -> bool {
        self.resolve(key).is_ok()
    }

    /// Renders one source of a bundle against `context`. Missing context
    /// variables are errors, not silent blanks.
    pub fn render<S: Serialize>(
        &self,
        source: &TemplateSource,
        context: S,
    ) -> Result<String, RenderError> {
        self.env
            .render_str(&source.body, context)
            .map_err(|e| RenderError {
                template: source.name.clone(),
                message: e.to_string(),
            })
    }

    /// Lists every key the registry can currently resolve
    pub fn discover(&self) -> Vec<DiscoveredTemplate> {
        let mut found = Vec::new();
        for &category in TemplateCategory::all() {
            for &language in Language::all() {
                let keys: Vec<TemplateKey> = if category == TemplateCategory::Interface {
                    InterfaceKind::all()
                        .iter()
                        .map(|&k| TemplateKey::interface(language, k))
                        .collect()
                } else {
                    vec![TemplateKey::plain(category, language)]
                };
                for key in keys {
                    if let Ok(bundle) = self.resolve(key) {
                        found.push(DiscoveredTemplate {
                            key,
                            origin: bundle.origin,
                            sources: bundle.sources.iter().map(|s| s.name.clone()).collect(),
                        });
                    }
                }
            }
        }
        found
    }

    fn resolve_uncached(&self, key: &TemplateKey) -> CachedResolution {
        let levels = [
            (self.project_dir.as_deref(), TemplateOrigin::ProjectLocal),
            (self.user_dir.as_deref(), TemplateOrigin::UserLevel),
        ];
        for (dir, origin) in levels {
            let Some(dir) = dir else { continue };
            if let Some(bundle) = self.resolve_override(dir, key, origin)? {
                return Ok(Arc::new(bundle));
            }
        }
        self.resolve_embedded(key)
            .map(Arc::new)
            .ok_or(TemplateNotFoundError { key: *key })
    }

    /// Candidate override paths for `key`, most specific first. A
    /// directory candidate holds one source per `.jinja` file inside it;
    /// a file candidate is a single-source bundle.
    fn override_candidates(&self, root: &Path, key: &TemplateKey) -> Vec<PathBuf> {
        let mut base = root.join(key.category.as_str());
        if let Some(interface) = key.interface {
            base = base.join(interface.as_str());
        }
        vec![
            base.join(key.language.as_str()),
            base.join(format!("{}.jinja", key.language.as_str())),
            base.join("any.jinja"),
        ]
    }

    fn resolve_override(
        &self,
        root: &Path,
        key: &TemplateKey,
        origin: TemplateOrigin,
    ) -> Result<Option<TemplateBundle>, TemplateNotFoundError> {
        for candidate in self.override_candidates(root, key) {
            if candidate.is_dir() {
                let sources = load_directory_sources(&candidate);
                if !sources.is_empty() {
                    return Ok(Some(TemplateBundle {
                        key: *key,
                        origin,
                        sources,
                        required_context: category_context(key.category),
                    }));
                }
            } else if candidate.is_file() {
                let body = match std::fs::read_to_string(&candidate) {
                    Ok(body) => body,
                    Err(_) => continue,
                };
                return Ok(Some(TemplateBundle {
                    key: *key,
                    origin,
                    sources: vec![TemplateSource {
                        name: "main".to_string(),
                        file_name: default_file_name(key),
                        body,
                    }],
                    required_context: category_context(key.category),
                }));
            }
        }
        Ok(None)
    }

    fn resolve_embedded(&self, key: &TemplateKey) -> Option<TemplateBundle> {
        // exact language match first, language-generic second
        let matched = EMBEDDED
            .iter()
            .find(|e| {
                e.category == key.category
                    && e.interface == key.interface
                    && e.language == Some(key.language)
            })
            .or_else(|| {
                EMBEDDED.iter().find(|e| {
                    e.category == key.category
                        && e.interface == key.interface
                        && e.language.is_none()
                })
            })?;
        Some(TemplateBundle {
            key: *key,
            origin: TemplateOrigin::Builtin,
            sources: matched
                .sources
                .iter()
                .map(|(name, file_name, body)| TemplateSource {
                    name: name.to_string(),
                    file_name: file_name.to_string(),
                    body: body.to_string(),
                })
                .collect(),
            required_context: category_context(key.category),
        })
    }

    /// Hashes the override files that could satisfy `key`, so a stale
    /// cached resolution is never served after an override changed
    fn override_fingerprint(&self, key: &TemplateKey) -> String {
        let mut hasher = Sha256::new();
        for dir in [self.project_dir.as_deref(), self.user_dir.as_deref()]
            .into_iter()
            .flatten()
        {
            for candidate in self.override_candidates(dir, key) {
                hasher.update(candidate.to_string_lossy().as_bytes());
                if candidate.is_dir() {
                    for source in load_directory_sources(&candidate) {
                        hasher.update(source.name.as_bytes());
                        hasher.update(source.body.as_bytes());
                    }
                } else if let Ok(body) = std::fs::read(&candidate) {
                    hasher.update(&body);
                }
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn load_directory_sources(dir: &Path) -> Vec<TemplateSource> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "jinja"))
        .collect();
    paths.sort();
    paths
        .into_iter()
        .filter_map(|path| {
            let body = std::fs::read_to_string(&path).ok()?;
            let file_name = path.file_name()?.to_string_lossy();
            let file_name = file_name.trim_end_matches(".jinja").to_string();
            Some(TemplateSource {
                name: file_name.clone(),
                file_name,
                body,
            })
        })
        .collect()
}
