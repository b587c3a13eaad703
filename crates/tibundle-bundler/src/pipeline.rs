//! The build pipeline
//!
//! One build invocation is a fixed sequence of fallible steps, each consuming
//! the previous step's output: validate the project, load the descriptor,
//! resolve transforms, load the manifest and compute exclusions, drive the
//! engine, rewrite the inline map, emit artifacts. The first failure aborts
//! the remainder; nothing is retried and partial output is left for the next
//! run to overwrite.

use crate::artifacts::{map_file_target, write_artifacts, BuildOutput, PRELUDE_PATH, PRELUDE_SRC};
use crate::engine::{BundleEngine, EngineRequest};
use crate::errors::PipelineError;
use crate::source_map::extract_and_rewrite;
use crate::transforms::{resolve_transform, Transform};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tibundle_config::PackageDescriptor;
use tibundle_manifest::{resolve_exclusions, DeployType, TiappManifest};
use tracing::{debug, info};

/// Build parameters supplied by the host.
#[derive(Debug, Clone)]
pub struct BuildParams {
    pub project_dir: PathBuf,
    pub platform: String,
    pub deploy_type: DeployType,
}

/// What a completed build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: BuildOutput,
    /// Module ids excluded from the bundle for this (platform, deploy type).
    pub excluded: BTreeSet<String>,
    /// Standalone export name the bundle was generated under.
    pub export_name: String,
}

/// Drives the external engine through one build at a time.
pub struct Pipeline<E> {
    engine: E,
}

impl<E: BundleEngine> Pipeline<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn run(&self, params: &BuildParams) -> Result<BuildReport, PipelineError> {
        if !params.project_dir.is_dir() {
            return Err(PipelineError::InvalidProject(params.project_dir.clone()));
        }

        let descriptor = PackageDescriptor::load(&params.project_dir)?;
        let options = descriptor.bundle_options();
        let export_name = descriptor.export_name(&params.project_dir);

        let mut transforms = Vec::with_capacity(options.transforms.len() + 1);
        for reference in &options.transforms {
            transforms.push(resolve_transform(&params.project_dir, reference)?);
        }
        // User transforms run first; platform resolution always closes the
        // chain so user transforms see the un-resolved require paths.
        transforms.push(Transform::platform_resolve(
            &params.platform,
            &options.extensions,
        ));

        let manifest = TiappManifest::from_path(&params.project_dir)?;
        let excluded = resolve_exclusions(&manifest, &params.platform, params.deploy_type)?;
        debug!(
            "excluding {} native module(s) for {}/{}",
            excluded.len(),
            params.platform,
            params.deploy_type
        );

        let request = EngineRequest {
            entry: params.project_dir.clone(),
            extensions: options.extensions,
            transforms,
            excludes: excluded.clone(),
            debug: params.deploy_type != DeployType::Production,
            standalone: export_name.clone(),
            prelude: PRELUDE_SRC.to_string(),
            prelude_path: PRELUDE_PATH.to_string(),
        };

        let bundle_text = self.engine.bundle(&request)?;
        info!("engine produced {} bytes of bundle text", bundle_text.len());

        let map = extract_and_rewrite(
            &bundle_text,
            &map_file_target(&params.platform),
            &params.project_dir,
        )?;
        let map_json = map.to_json()?;

        let output = write_artifacts(
            &params.project_dir,
            &params.platform,
            &bundle_text,
            &map_json,
        )?;

        Ok(BuildReport {
            output,
            excluded,
            export_name,
        })
    }
}
