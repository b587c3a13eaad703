//! External bundling engine seam
//!
//! The module-graph bundling algorithm lives outside this codebase. The
//! pipeline drives it through [`BundleEngine`]: given an entry root,
//! extensions, transforms, excludes and generation options, the engine
//! returns the bundle text (UTF-8) with an inline source-map comment, or
//! fails. [`CommandEngine`] is the production implementation and shells out
//! to a browserify-compatible executable.

use crate::errors::EngineError;
use crate::transforms::Transform;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// One bundling invocation, consumed by the engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Project root added as the bundle entry.
    pub entry: PathBuf,
    /// File extensions the engine resolves require paths against.
    pub extensions: Vec<String>,
    /// Transforms in application order; platform resolution is last.
    pub transforms: Vec<Transform>,
    /// Module ids the engine must leave unresolved.
    pub excludes: BTreeSet<String>,
    /// Emit inline source maps.
    pub debug: bool,
    /// Standalone export name for the bundle.
    pub standalone: String,
    /// Runtime preamble injected at the top of the bundle.
    pub prelude: String,
    /// Path recorded for the preamble in generated maps.
    pub prelude_path: String,
}

/// Capability contract for the external bundler.
pub trait BundleEngine {
    /// Produce bundle text for one request. Any engine-level failure
    /// (unresolved module, syntax error in source) is terminal; the
    /// pipeline never retries.
    fn bundle(&self, request: &EngineRequest) -> Result<String, EngineError>;
}

/// Bundler engine backed by an external executable.
///
/// The request maps onto a browserify-style command line: `--entry` last,
/// one `--extension`/`--transform`/`--exclude` per value, `--debug` for
/// source-map builds, `--standalone` and `--prelude-path` as options, with
/// the preamble text supplied on stdin. Bundle text is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
}

impl CommandEngine {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn build_command(&self, request: &EngineRequest) -> Command {
        let mut command = Command::new(&self.program);
        for extension in &request.extensions {
            command.arg("--extension").arg(extension);
        }
        for transform in &request.transforms {
            command.arg("--transform").arg(transform.engine_spec());
        }
        for exclude in &request.excludes {
            command.arg("--exclude").arg(exclude);
        }
        if request.debug {
            command.arg("--debug");
        }
        // Unresolved requires outside the exclude set must fail the build,
        // never be silently dropped.
        command.arg("--fail-fast");
        command.arg("--standalone").arg(&request.standalone);
        command.arg("--prelude-path").arg(&request.prelude_path);
        command.arg(&request.entry);
        command
    }
}

impl BundleEngine for CommandEngine {
    fn bundle(&self, request: &EngineRequest) -> Result<String, EngineError> {
        debug!(
            "invoking bundler engine {} for {}",
            self.program.display(),
            request.entry.display()
        );

        let mut child = self
            .build_command(request)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.prelude.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| EngineError::InvalidOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EngineRequest {
        EngineRequest {
            entry: PathBuf::from("/p"),
            extensions: vec![".js".to_string()],
            transforms: vec![Transform::platform_resolve("ios", &[".js".to_string()])],
            excludes: ["ti.map".to_string()].into_iter().collect(),
            debug: true,
            standalone: "demo".to_string(),
            prelude: "(function(){})".to_string(),
            prelude_path: "build/map/prelude.js".to_string(),
        }
    }

    #[test]
    fn test_command_carries_excludes_and_flags() {
        let engine = CommandEngine::new(PathBuf::from("bundler"));
        let command = engine.build_command(&request());
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.windows(2).any(|w| w[0] == "--exclude" && w[1] == "ti.map"));
        assert!(args.contains(&"--debug".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--standalone" && w[1] == "demo"));
        assert_eq!(args.last().map(String::as_str), Some("/p"));
    }

    #[test]
    fn test_no_debug_flag_for_production_requests() {
        let engine = CommandEngine::new(PathBuf::from("bundler"));
        let mut request = request();
        request.debug = false;
        let command = engine.build_command(&request);
        let args: Vec<String> = command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(!args.contains(&"--debug".to_string()));
    }
}
