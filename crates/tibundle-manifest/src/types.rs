//! Core manifest types: deploy types, module declarations, and queries.

use crate::errors::ManifestError;
use std::fmt;
use std::str::FromStr;

/// Version value used when a plugin or module carries no explicit version.
pub const LATEST: &str = "latest";

/// The build flavor a module declaration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeployType {
    Development,
    Test,
    Production,
}

impl DeployType {
    /// All deploy types, in declaration order.
    pub const ALL: [DeployType; 3] = [
        DeployType::Development,
        DeployType::Test,
        DeployType::Production,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeployType::Development => "development",
            DeployType::Test => "test",
            DeployType::Production => "production",
        }
    }
}

impl fmt::Display for DeployType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployType {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(DeployType::Development),
            "test" => Ok(DeployType::Test),
            "production" => Ok(DeployType::Production),
            other => Err(ManifestError::InvalidDeployType(other.to_string())),
        }
    }
}

/// Which deploy types a module declaration applies to.
///
/// A declaration without a `deploy-type` attribute applies to every deploy
/// type; one with the attribute applies to that deploy type only. Multiple
/// declarations for the same (platform, id) pair OR their masks together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeployTypeMask {
    pub development: bool,
    pub test: bool,
    pub production: bool,
}

impl DeployTypeMask {
    /// Mask matching every deploy type.
    pub fn all() -> Self {
        Self {
            development: true,
            test: true,
            production: true,
        }
    }

    /// Mask matching exactly one deploy type.
    pub fn only(deploy_type: DeployType) -> Self {
        let mut mask = Self::default();
        mask.set(deploy_type);
        mask
    }

    /// Mask for a raw declaration: all types when the attribute is absent,
    /// one type when it is present.
    pub fn from_declaration(deploy_type: Option<DeployType>) -> Self {
        match deploy_type {
            None => Self::all(),
            Some(dt) => Self::only(dt),
        }
    }

    pub fn set(&mut self, deploy_type: DeployType) {
        match deploy_type {
            DeployType::Development => self.development = true,
            DeployType::Test => self.test = true,
            DeployType::Production => self.production = true,
        }
    }

    pub fn contains(self, deploy_type: DeployType) -> bool {
        match deploy_type {
            DeployType::Development => self.development,
            DeployType::Test => self.test,
            DeployType::Production => self.production,
        }
    }

    /// OR another mask into this one.
    pub fn merge(&mut self, other: DeployTypeMask) {
        self.development |= other.development;
        self.test |= other.test;
        self.production |= other.production;
    }
}

/// One native-module reference, merged across raw declarations sharing the
/// same (platform, id) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDeclaration {
    pub id: String,
    pub version: String,
    pub platform: String,
    pub deploy_types: DeployTypeMask,
}

/// Filter for [`crate::TiappManifest::modules`].
///
/// `platform`/`deploy_type` are conveniences for the common single-value
/// case; they are folded into the list forms. Empty lists mean no filter.
#[derive(Debug, Clone, Default)]
pub struct ModuleQuery {
    pub platform: Option<String>,
    pub platforms: Vec<String>,
    pub deploy_type: Option<DeployType>,
    pub deploy_types: Vec<DeployType>,
}

impl ModuleQuery {
    /// Query for a single (platform, deploy type) pair.
    pub fn for_build(platform: &str, deploy_type: DeployType) -> Self {
        Self {
            platform: Some(platform.to_string()),
            deploy_type: Some(deploy_type),
            ..Default::default()
        }
    }

    fn effective_platforms(&self) -> Vec<&str> {
        let mut platforms: Vec<&str> = self.platforms.iter().map(String::as_str).collect();
        if let Some(platform) = &self.platform {
            platforms.push(platform);
        }
        platforms
    }

    fn effective_deploy_types(&self) -> Vec<DeployType> {
        let mut deploy_types = self.deploy_types.clone();
        if let Some(deploy_type) = self.deploy_type {
            deploy_types.push(deploy_type);
        }
        deploy_types
    }

    /// Whether a merged declaration passes this filter.
    pub fn matches(&self, module: &ModuleDeclaration) -> bool {
        let platforms = self.effective_platforms();
        if !platforms.is_empty() && !platforms.contains(&module.platform.as_str()) {
            return false;
        }

        let deploy_types = self.effective_deploy_types();
        if !deploy_types.is_empty()
            && !deploy_types
                .iter()
                .any(|dt| module.deploy_types.contains(*dt))
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_type_parse() {
        assert_eq!("test".parse::<DeployType>().unwrap(), DeployType::Test);
        assert!(matches!(
            "staging".parse::<DeployType>(),
            Err(ManifestError::InvalidDeployType(s)) if s == "staging"
        ));
    }

    #[test]
    fn test_mask_from_declaration() {
        assert_eq!(DeployTypeMask::from_declaration(None), DeployTypeMask::all());

        let mask = DeployTypeMask::from_declaration(Some(DeployType::Production));
        assert!(mask.production);
        assert!(!mask.development);
        assert!(!mask.test);
    }

    #[test]
    fn test_mask_merge_is_or() {
        let mut mask = DeployTypeMask::only(DeployType::Development);
        mask.merge(DeployTypeMask::only(DeployType::Test));
        assert!(mask.development);
        assert!(mask.test);
        assert!(!mask.production);
    }

    #[test]
    fn test_query_no_filter_matches_all() {
        let module = ModuleDeclaration {
            id: "ti.map".to_string(),
            version: LATEST.to_string(),
            platform: "ios".to_string(),
            deploy_types: DeployTypeMask::only(DeployType::Test),
        };
        assert!(ModuleQuery::default().matches(&module));
    }

    #[test]
    fn test_query_filters_platform_and_deploy_type() {
        let module = ModuleDeclaration {
            id: "ti.map".to_string(),
            version: LATEST.to_string(),
            platform: "ios".to_string(),
            deploy_types: DeployTypeMask::all(),
        };

        assert!(ModuleQuery::for_build("ios", DeployType::Production).matches(&module));
        assert!(!ModuleQuery::for_build("android", DeployType::Production).matches(&module));

        let narrow = ModuleDeclaration {
            deploy_types: DeployTypeMask::only(DeployType::Development),
            ..module
        };
        assert!(!ModuleQuery::for_build("ios", DeployType::Production).matches(&narrow));
        assert!(ModuleQuery::for_build("ios", DeployType::Development).matches(&narrow));
    }
}
