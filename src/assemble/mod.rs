//! Package assembly: collecting validated artifacts into a writable plan
//!
//! The plan is a path-to-artifact map built up as targets finish. Path
//! collisions are resolved per artifact kind: documentation is overwritten
//! in declaration order, logic collisions are rejected outright, interface
//! collisions are retried under an interface-kind prefix. Nothing touches
//! the filesystem until [`PackagePlan::materialize`] runs.

use crate::artifact::{ArtifactKind, GeneratedArtifact, GenerationTarget};
use crate::config::{CollisionConfig, CollisionPolicy};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("path collision at '{path}': produced by both {first} and {second}")]
    Collision {
        path: String,
        first: GenerationTarget,
        second: GenerationTarget,
    },
    #[error("artifact path '{path}' escapes the output directory")]
    PathEscape { path: String },
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Deterministic map from package-relative paths to artifact content
#[derive(Debug)]
pub struct PackagePlan {
    collision: CollisionConfig,
    files: BTreeMap<PathBuf, GeneratedArtifact>,
}

impl PackagePlan {
    pub fn new(collision: CollisionConfig) -> Self {
        Self {
            collision,
            files: BTreeMap::new(),
        }
    }

    fn policy_for(&self, kind: ArtifactKind) -> CollisionPolicy {
        match kind {
            ArtifactKind::Logic => self.collision.logic,
            ArtifactKind::Interface => self.collision.interface,
            ArtifactKind::Doc => self.collision.docs,
            // identical content per function, last writer wins
            ArtifactKind::Test | ArtifactKind::Manifest => {
                CollisionPolicy::OverwriteInDeclarationOrder
            }
        }
    }

    /// Adds an artifact, applying the collision policy for its kind when
    /// the path is already taken. Insertion order is declaration order.
    pub fn insert(&mut self, artifact: GeneratedArtifact) -> Result<(), AssembleError> {
        let path = artifact.relative_path.clone();
        check_contained(&path)?;
        let Some(existing) = self.files.get(&path) else {
            self.files.insert(path, artifact);
            return Ok(());
        };
        match self.policy_for(artifact.kind) {
            CollisionPolicy::OverwriteInDeclarationOrder => {
                debug!(path = %path.display(), target = %artifact.target, "overwriting earlier artifact");
                self.files.insert(path, artifact);
                Ok(())
            }
            CollisionPolicy::Reject => Err(AssembleError::Collision {
                path: path.display().to_string(),
                first: existing.target.clone(),
                second: artifact.target.clone(),
            }),
            CollisionPolicy::NamespaceByInterface => {
                let namespaced =
                    Path::new(artifact.target.interface.as_str()).join(&artifact.relative_path);
                if let Some(occupied) = self.files.get(&namespaced) {
                    return Err(AssembleError::Collision {
                        path: namespaced.display().to_string(),
                        first: occupied.target.clone(),
                        second: artifact.target.clone(),
                    });
                }
                let mut artifact = artifact;
                artifact.relative_path = namespaced.clone();
                self.files.insert(namespaced, artifact);
                Ok(())
            }
        }
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &GeneratedArtifact)> {
        self.files.iter().map(|(p, a)| (p.as_path(), a))
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&GeneratedArtifact> {
        self.files.get(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every planned file under `output_dir`, creating parent
    /// directories as needed. Returns the written paths.
    pub fn materialize(&self, output_dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
        let mut written = Vec::with_capacity(self.files.len());
        for (relative, artifact) in &self.files {
            let destination = output_dir.join(relative);
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|source| AssembleError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            std::fs::write(&destination, &artifact.content).map_err(|source| {
                AssembleError::Io {
                    path: destination.display().to_string(),
                    source,
                }
            })?;
            written.push(destination);
        }
        info!(files = written.len(), dir = %output_dir.display(), "package written");
        Ok(written)
    }
}

/// Relative, no parent traversal. Artifact paths come from templates and
/// function names, neither of which may reach outside the package root.
fn check_contained(path: &Path) -> Result<(), AssembleError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir));
    if escapes {
        return Err(AssembleError::PathEscape {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
