//! Error types for the bundling pipeline
//!
//! Every step failure is terminal for the current build invocation; nothing
//! in the pipeline retries, and errors are surfaced verbatim to the host.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;
use tibundle_config::ConfigError;
use tibundle_manifest::ManifestError;

/// Failure reported by the external bundling engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to launch bundler engine '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bundler engine I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("bundler engine exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("bundler engine produced non-UTF-8 output")]
    InvalidOutput,
}

/// Failure while extracting or decoding the inline source map.
#[derive(Error, Debug)]
pub enum SourceMapError {
    #[error("source map not found in bundle output")]
    NotFound,

    #[error("source map comment does not carry a base64 data URI payload")]
    MissingPayload,

    #[error("failed to decode source map payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to parse source map JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level pipeline failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("project directory {} is not a directory", .0.display())]
    InvalidProject(PathBuf),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load transform '{0}'")]
    TransformLoad(String),

    #[error("bundling failed: {0}")]
    Bundle(#[from] EngineError),

    #[error("source map error: {0}")]
    SourceMap(#[from] SourceMapError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
