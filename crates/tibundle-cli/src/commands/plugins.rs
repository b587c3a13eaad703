//! Plugin maintenance over the project manifest: install, remove, list.

use crate::logger;
use colored::Colorize;
use std::path::Path;
use tibundle_manifest::{ManifestError, TiappManifest};

/// Declare a plugin in the manifest, saving only when the document changed.
pub fn install_plugin(
    project_dir: &Path,
    id: &str,
    version: Option<&str>,
) -> Result<(), ManifestError> {
    let mut manifest = TiappManifest::from_path(project_dir)?;

    if manifest.install_plugin(id, version)? {
        manifest.save()?;
        logger::success(&format!("Installed plugin '{}'", id));
    } else {
        println!("Plugin '{}' is already declared; nothing to do.", id);
    }

    Ok(())
}

/// Remove a plugin declaration, saving only when the document changed.
pub fn remove_plugin(project_dir: &Path, id: &str) -> Result<(), ManifestError> {
    let mut manifest = TiappManifest::from_path(project_dir)?;

    if manifest.uninstall_plugin(id)? {
        manifest.save()?;
        logger::success(&format!("Removed plugin '{}'", id));
    } else {
        println!("Plugin '{}' is not declared; nothing to do.", id);
    }

    Ok(())
}

/// Print the plugins declared in the manifest.
pub fn list_plugins(project_dir: &Path, json: bool) -> Result<(), ManifestError> {
    let manifest = TiappManifest::from_path(project_dir)?;
    let plugins = manifest.plugins()?;

    if json {
        let value: serde_json::Map<String, serde_json::Value> = plugins
            .iter()
            .map(|(id, version)| (id.clone(), serde_json::Value::String(version.clone())))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    if plugins.is_empty() {
        println!("No plugins declared.");
        return Ok(());
    }

    println!("{}", "Declared plugins:".bold());
    for (id, version) in &plugins {
        println!("  {} ({})", id, version);
    }

    Ok(())
}
