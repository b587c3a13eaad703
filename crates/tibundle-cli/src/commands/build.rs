//! The `build` command: run the bundling pipeline for one platform.

use crate::logger;
use crate::GlobalOpts;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tibundle_bundler::{BuildParams, CommandEngine, Pipeline, PipelineError};
use tibundle_config::{Config, ConfigError};
use tibundle_manifest::{DeployType, ManifestError};

#[derive(Parser, Debug)]
pub struct BuildCommand {
    /// Project directory (searched upward for tiapp.xml)
    #[arg(value_name = "PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Target platform (e.g. ios, android)
    #[arg(short, long)]
    pub platform: String,

    /// Deploy type for the build
    #[arg(long, value_name = "TYPE", default_value = "development")]
    pub deploy_type: String,

    /// Build target used for deploy-type remapping (e.g. dist-playstore)
    #[arg(long)]
    pub target: Option<String>,

    /// Device family reported by the host build (informational)
    #[arg(long, value_name = "FAMILY")]
    pub device_family: Option<String>,

    /// Bundler engine executable override
    #[arg(long, value_name = "PATH")]
    pub engine: Option<PathBuf>,
}

#[derive(Debug)]
pub enum BuildError {
    Manifest(ManifestError),
    Config(ConfigError),
    Pipeline(PipelineError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Manifest(e) => write!(f, "Manifest error: {}", e),
            BuildError::Config(e) => write!(f, "Configuration error: {}", e),
            BuildError::Pipeline(e) => write!(f, "Build error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<ManifestError> for BuildError {
    fn from(e: ManifestError) -> Self {
        BuildError::Manifest(e)
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

impl From<PipelineError> for BuildError {
    fn from(e: PipelineError) -> Self {
        BuildError::Pipeline(e)
    }
}

pub fn handle_build(cmd: BuildCommand, opts: GlobalOpts) -> Result<(), BuildError> {
    let config = Config::load()?;

    if let Some(family) = &cmd.device_family {
        logger::debug(&format!("device family: {}", family));
    }

    let mut deploy_type: DeployType = cmd.deploy_type.parse()?;
    if let Some(target) = &cmd.target {
        if let Some(remapped) = config.deploy_type_for_target(&cmd.platform, target) {
            logger::debug(&format!(
                "target '{}' remaps deploy type to {}",
                target, remapped
            ));
            deploy_type = remapped.parse()?;
        }
    }

    let engine_path = config.resolve_engine(cmd.engine.as_deref())?;
    logger::debug(&format!("bundler engine: {}", engine_path.display()));

    let pipeline = Pipeline::new(CommandEngine::new(engine_path));
    let params = BuildParams {
        project_dir: cmd.project_dir.clone(),
        platform: cmd.platform.clone(),
        deploy_type,
    };

    logger::spinner_start(&format!(
        "Bundling {} ({})",
        cmd.platform, deploy_type
    ));
    let start = Instant::now();

    let report = match pipeline.run(&params) {
        Ok(report) => {
            logger::spinner_success(&format!(
                "Bundled {} for {} ({})",
                report.export_name,
                cmd.platform,
                format_duration(start.elapsed())
            ));
            report
        }
        Err(e) => {
            logger::spinner_error(&format!(
                "Bundling {} failed ({})",
                cmd.platform,
                format_duration(start.elapsed())
            ));
            return Err(BuildError::Pipeline(e));
        }
    };

    if !report.excluded.is_empty() {
        logger::info(&format!(
            "excluded native modules: {}",
            report
                .excluded
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    if opts.verbosity_level() >= 1 {
        eprintln!("{}", "Artifacts:".bold());
        for path in report.output.paths() {
            eprintln!("  {}", path.display());
        }
    }

    Ok(())
}

fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
