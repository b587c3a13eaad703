//! Source transform resolution
//!
//! Transform references come from the project descriptor as either installed
//! module names or project-relative script paths. References are resolved
//! eagerly so a dangling reference fails the build before the engine runs.
//! The platform-resolution transform is appended by the pipeline after all
//! user transforms; that ordering is fixed.

use crate::errors::PipelineError;
use std::path::{Path, PathBuf};

/// A resolved source transform, ready to hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// A transform module installed under `node_modules/`.
    Module(String),
    /// A transform script inside the project.
    Script(PathBuf),
    /// The mandatory platform-resolution transform: rewrites
    /// platform-qualified require paths to the variant file for the target
    /// platform, considering the recognized extensions.
    PlatformResolve {
        platforms: Vec<String>,
        extensions: Vec<String>,
    },
}

impl Transform {
    /// The platform-resolution transform for one target platform.
    pub fn platform_resolve(platform: &str, extensions: &[String]) -> Self {
        Transform::PlatformResolve {
            platforms: vec![platform.to_string()],
            extensions: extensions.to_vec(),
        }
    }

    /// The transform's spelling in the engine's command-line protocol.
    pub fn engine_spec(&self) -> String {
        match self {
            Transform::Module(name) => name.clone(),
            Transform::Script(path) => path.display().to_string(),
            Transform::PlatformResolve {
                platforms,
                extensions,
            } => format!(
                "platform-resolve:{}:{}",
                platforms.join("+"),
                extensions.join(",")
            ),
        }
    }
}

/// Resolve a configured transform reference against the project root.
///
/// `./relative` and absolute references must name an existing script; bare
/// names must name an installed module directory.
pub fn resolve_transform(project_dir: &Path, reference: &str) -> Result<Transform, PipelineError> {
    if reference.starts_with("./")
        || reference.starts_with("../")
        || Path::new(reference).is_absolute()
    {
        let path = project_dir.join(reference);
        if path.is_file() {
            return Ok(Transform::Script(path));
        }
        return Err(PipelineError::TransformLoad(reference.to_string()));
    }

    if project_dir.join("node_modules").join(reference).is_dir() {
        return Ok(Transform::Module(reference.to_string()));
    }
    Err(PipelineError::TransformLoad(reference.to_string()))
}
