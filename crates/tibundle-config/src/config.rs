//! User-level tool configuration
//!
//! Stored as TOML under the user's config directory. Holds the bundler
//! engine override and the target -> deploy-type remapping tables, which are
//! configuration data so the build-system naming conventions they encode can
//! change without touching the pipeline.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location (used by tests).
pub const CONFIG_ENV: &str = "TIBUNDLE_CONFIG";

/// Engine executable looked up on PATH when nothing is configured.
pub const DEFAULT_ENGINE: &str = "browserify";

/// Target -> deploy-type remapping for one platform family.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployTargetMap {
    /// Deploy type for targets not listed in `targets`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Explicit target name mappings.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

/// The tool configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Bundler engine executable (name or path). Falls back to
    /// [`DEFAULT_ENGINE`] on PATH when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,

    /// Per-platform target -> deploy-type remapping.
    #[serde(default)]
    pub deploy_targets: BTreeMap<String, DeployTargetMap>,
}

impl Default for Config {
    fn default() -> Self {
        let mut android = DeployTargetMap {
            fallback: Some("development".to_string()),
            targets: BTreeMap::new(),
        };
        android
            .targets
            .insert("dist-playstore".to_string(), "production".to_string());
        android
            .targets
            .insert("device".to_string(), "test".to_string());
        android
            .targets
            .insert("emulator".to_string(), "development".to_string());

        let mut deploy_targets = BTreeMap::new();
        deploy_targets.insert("android".to_string(), android);

        Self {
            engine: None,
            deploy_targets,
        }
    }
}

impl Config {
    /// The config file path: `TIBUNDLE_CONFIG` when set, otherwise
    /// `<config dir>/tibundle/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path()?)
    }

    /// Load from a specific path; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        // A config that never mentions deploy targets keeps the built-in
        // remapping tables.
        if config.deploy_targets.is_empty() {
            config.deploy_targets = Self::default().deploy_targets;
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::path()?)
    }

    /// Save to a specific path, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the bundler engine executable: explicit override first, then
    /// the configured engine, then [`DEFAULT_ENGINE`] on PATH.
    pub fn resolve_engine(&self, override_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        if let Some(engine) = &self.engine {
            let path = Path::new(engine);
            if path.components().count() > 1 {
                return Ok(path.to_path_buf());
            }
            return which::which(engine)
                .map_err(|_| ConfigError::EngineNotFound(engine.clone()));
        }
        which::which(DEFAULT_ENGINE)
            .map_err(|_| ConfigError::EngineNotFound(DEFAULT_ENGINE.to_string()))
    }

    /// Deploy type name for a build target, per the remapping tables.
    ///
    /// Returns `None` when the platform has no remapping, in which case the
    /// caller keeps the deploy type it already has.
    pub fn deploy_type_for_target(&self, platform: &str, target: &str) -> Option<&str> {
        let map = self.deploy_targets.get(platform)?;
        map.targets
            .get(target)
            .or(map.fallback.as_ref())
            .map(String::as_str)
    }
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .map(|home| home.join(".config").join("tibundle"))
            .ok_or(ConfigError::NoConfigDir)
    }

    #[cfg(target_os = "windows")]
    {
        dirs::config_dir()
            .map(|dir| dir.join("tibundle"))
            .ok_or(ConfigError::NoConfigDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_android_targets() {
        let config = Config::default();
        assert_eq!(
            config.deploy_type_for_target("android", "dist-playstore"),
            Some("production")
        );
        assert_eq!(
            config.deploy_type_for_target("android", "device"),
            Some("test")
        );
        assert_eq!(
            config.deploy_type_for_target("android", "emulator"),
            Some("development")
        );
    }

    #[test]
    fn test_unknown_android_target_falls_back_to_development() {
        let config = Config::default();
        assert_eq!(
            config.deploy_type_for_target("android", "something-new"),
            Some("development")
        );
    }

    #[test]
    fn test_other_platforms_have_no_remapping() {
        let config = Config::default();
        assert_eq!(config.deploy_type_for_target("ios", "device"), None);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_default_deploy_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "engine = \"browserify\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.engine.as_deref(), Some("browserify"));
        assert_eq!(
            config.deploy_type_for_target("android", "dist-playstore"),
            Some("production")
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.engine = Some("/opt/bundler/bin/engine".to_string());
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_resolve_engine_prefers_override() {
        let config = Config::default();
        let resolved = config
            .resolve_engine(Some(Path::new("/tmp/fake-engine")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/fake-engine"));
    }

    #[test]
    fn test_resolve_engine_uses_configured_path() {
        let mut config = Config::default();
        config.engine = Some("/opt/bundler/bin/engine".to_string());
        let resolved = config.resolve_engine(None).unwrap();
        assert_eq!(resolved, PathBuf::from("/opt/bundler/bin/engine"));
    }
}
