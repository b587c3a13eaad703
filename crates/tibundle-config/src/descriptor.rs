//! Project package descriptor (`package.json`)
//!
//! The descriptor supplies the bundle's export name and an optional
//! `npmify`/`browserify` option block with recognized file extensions and
//! source transforms. `npmify` wins when both blocks are present.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Descriptor file name inside the project root.
pub const DESCRIPTOR_FILENAME: &str = "package.json";

/// Bundle options as written in the descriptor; missing fields fall back to
/// the defaults in [`ResolvedBundleOptions`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct BundleOptions {
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub transforms: Option<Vec<String>>,
}

/// Bundle options with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundleOptions {
    /// File extensions the bundler resolves require paths against.
    pub extensions: Vec<String>,
    /// Source transform references, applied in order before the mandatory
    /// platform-resolution transform.
    pub transforms: Vec<String>,
}

impl Default for ResolvedBundleOptions {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string(), ".json".to_string()],
            transforms: Vec::new(),
        }
    }
}

/// The parsed `package.json`, reduced to the fields the pipeline consumes.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub npmify: Option<BundleOptions>,
    #[serde(default)]
    pub browserify: Option<BundleOptions>,
}

impl PackageDescriptor {
    /// Load the descriptor from a project root.
    ///
    /// A missing file yields the default descriptor (a project without a
    /// `package.json` still bundles); a malformed one is an error.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(DESCRIPTOR_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Effective bundle options: the `npmify` block, else the `browserify`
    /// block, else nothing, with defaults filled in.
    pub fn bundle_options(&self) -> ResolvedBundleOptions {
        let block = self
            .npmify
            .as_ref()
            .or(self.browserify.as_ref())
            .cloned()
            .unwrap_or_default();
        let defaults = ResolvedBundleOptions::default();
        ResolvedBundleOptions {
            extensions: block.extensions.unwrap_or(defaults.extensions),
            transforms: block.transforms.unwrap_or(defaults.transforms),
        }
    }

    /// The bundle's standalone export name: the package name, else the
    /// project directory name.
    pub fn export_name(&self, project_dir: &Path) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        project_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_descriptor_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = PackageDescriptor::load(dir.path()).unwrap();
        assert_eq!(descriptor, PackageDescriptor::default());
        assert_eq!(
            descriptor.bundle_options().extensions,
            vec![".js".to_string(), ".json".to_string()]
        );
    }

    #[test]
    fn test_malformed_descriptor_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILENAME), "{not json").unwrap();
        assert!(matches!(
            PackageDescriptor::load(dir.path()),
            Err(ConfigError::Descriptor(_))
        ));
    }

    #[test]
    fn test_npmify_wins_over_browserify() {
        let json = r#"{
            "name": "demo-app",
            "npmify": { "transforms": ["coffeeify"] },
            "browserify": { "transforms": ["ignored"], "extensions": [".coffee"] }
        }"#;
        let descriptor: PackageDescriptor = serde_json::from_str(json).unwrap();
        let options = descriptor.bundle_options();
        assert_eq!(options.transforms, vec!["coffeeify".to_string()]);
        // The npmify block has no extensions, so the defaults apply; the
        // browserify block is not consulted for individual fields.
        assert_eq!(
            options.extensions,
            vec![".js".to_string(), ".json".to_string()]
        );
    }

    #[test]
    fn test_browserify_block_used_when_no_npmify() {
        let json = r#"{ "browserify": { "extensions": [".js", ".coffee"] } }"#;
        let descriptor: PackageDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            descriptor.bundle_options().extensions,
            vec![".js".to_string(), ".coffee".to_string()]
        );
    }

    #[test]
    fn test_export_name_falls_back_to_directory() {
        let descriptor = PackageDescriptor::default();
        assert_eq!(
            descriptor.export_name(Path::new("/work/projects/myapp")),
            "myapp"
        );

        let named: PackageDescriptor =
            serde_json::from_str(r#"{ "name": "demo-app" }"#).unwrap();
        assert_eq!(named.export_name(Path::new("/work/projects/myapp")), "demo-app");
    }
}
