//! Tiapp manifest management
//!
//! This crate owns the project manifest (`tiapp.xml`): parsing it into an
//! owned document tree, typed queries over the declared plugins and native
//! modules, plugin install/uninstall mutation, and resolution of the
//! native-module exclusion set consumed by the bundling pipeline.

pub mod errors;
pub mod exclusions;
pub mod manifest;
pub mod types;
pub mod xml;

pub use errors::ManifestError;
pub use exclusions::resolve_exclusions;
pub use manifest::{TiappManifest, MANIFEST_FILENAME};
pub use types::{DeployType, DeployTypeMask, ModuleDeclaration, ModuleQuery, LATEST};
