//! The `modules` command: inspect native-module declarations and the
//! exclusion set they produce for a build.

use colored::Colorize;
use std::path::Path;
use tibundle_manifest::{
    resolve_exclusions, DeployType, DeployTypeMask, ManifestError, ModuleQuery, TiappManifest,
};

pub fn handle_modules(
    project_dir: &Path,
    platform: Option<String>,
    deploy_type: Option<String>,
    json: bool,
) -> Result<(), ManifestError> {
    let manifest = TiappManifest::from_path(project_dir)?;

    let deploy_type = deploy_type
        .as_deref()
        .map(str::parse::<DeployType>)
        .transpose()?;

    let query = ModuleQuery {
        platform: platform.clone(),
        deploy_type,
        ..Default::default()
    };
    let modules = manifest.modules(&query)?;

    if json {
        let value: Vec<serde_json::Value> = modules
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "version": m.version,
                    "platform": m.platform,
                    "deployTypes": {
                        "development": m.deploy_types.development,
                        "test": m.deploy_types.test,
                        "production": m.deploy_types.production,
                    },
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    if modules.is_empty() {
        println!("No native modules match.");
        return Ok(());
    }

    println!("{}", "Native modules:".bold());
    for module in &modules {
        println!(
            "  {:10} {} ({}) [{}]",
            module.platform,
            module.id,
            module.version,
            mask_label(module.deploy_types)
        );
    }

    if let (Some(platform), Some(deploy_type)) = (platform.as_deref(), deploy_type) {
        let excluded = resolve_exclusions(&manifest, platform, deploy_type)?;
        println!(
            "\n{} {}",
            "Exclusion set for this build:".bold(),
            excluded
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}

fn mask_label(mask: DeployTypeMask) -> String {
    if mask == DeployTypeMask::all() {
        return "all".to_string();
    }
    DeployType::ALL
        .iter()
        .filter(|dt| mask.contains(**dt))
        .map(|dt| dt.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_label() {
        assert_eq!(mask_label(DeployTypeMask::all()), "all");
        assert_eq!(
            mask_label(DeployTypeMask::only(DeployType::Test)),
            "test"
        );
    }
}
