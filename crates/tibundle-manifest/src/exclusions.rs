//! Native-module exclusion resolution
//!
//! Modules declared in the manifest are supplied by the host platform at
//! runtime, so the bundler must leave their require paths unresolved. The
//! exclusion set for a build is the ids of every module visible to that
//! build's (platform, deploy type) pair.

use crate::errors::ManifestError;
use crate::manifest::TiappManifest;
use crate::types::{DeployType, ModuleQuery};
use std::collections::BTreeSet;

/// Module ids the bundler must exclude for one (platform, deploy type) pair.
///
/// Pure over the manifest contents: permuting the raw declarations yields the
/// same set.
pub fn resolve_exclusions(
    manifest: &TiappManifest,
    platform: &str,
    deploy_type: DeployType,
) -> Result<BTreeSet<String>, ManifestError> {
    let modules = manifest.modules(&ModuleQuery::for_build(platform, deploy_type))?;
    Ok(modules.into_iter().map(|module| module.id).collect())
}
