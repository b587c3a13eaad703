//! Bundling pipeline for manifest-driven app builds
//!
//! Orchestrates the external bundling engine for one build at a time:
//! computes the native-module exclusion set from the project manifest, drives
//! the engine, rewrites the inline source map to project-relative form, and
//! persists the output artifact set. The engine itself is a capability
//! object behind [`BundleEngine`]; this crate never implements module-graph
//! resolution.

pub mod artifacts;
pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod source_map;
pub mod transforms;

pub use artifacts::{
    map_file_target, write_artifacts, BuildOutput, APP_SRC, EMPTY_SRC, PRELUDE_PATH, PRELUDE_SRC,
};
pub use engine::{BundleEngine, CommandEngine, EngineRequest};
pub use errors::{EngineError, PipelineError, SourceMapError};
pub use pipeline::{BuildParams, BuildReport, Pipeline};
pub use source_map::{extract_and_rewrite, SourceMap};
pub use transforms::{resolve_transform, Transform};
