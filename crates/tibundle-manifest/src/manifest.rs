//! Manifest operations - loading, saving, and the plugin/module queries
//!
//! The manifest is the project's `tiapp.xml`: a root element holding, among
//! other app configuration, at most one `<plugins>` section and at most one
//! `<modules>` section. Parsing is tolerant; the section queries are strict
//! and raise [`ManifestError::DuplicateSection`] when a root section is
//! declared twice.

use crate::errors::ManifestError;
use crate::types::{DeployType, DeployTypeMask, ModuleDeclaration, ModuleQuery, LATEST};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Canonical manifest file name.
pub const MANIFEST_FILENAME: &str = "tiapp.xml";

const PLUGINS_TAG: &str = "plugins";
const PLUGIN_TAG: &str = "plugin";
const MODULES_TAG: &str = "modules";
const MODULE_TAG: &str = "module";
const VERSION_ATTR: &str = "version";
const PLATFORM_ATTR: &str = "platform";
const DEPLOY_TYPE_ATTR: &str = "deploy-type";

/// A parsed `tiapp.xml` document.
///
/// Mutations go through [`install_plugin`](Self::install_plugin) and
/// [`uninstall_plugin`](Self::uninstall_plugin); nothing is persisted until
/// [`save`](Self::save) is called explicitly.
#[derive(Debug, Clone)]
pub struct TiappManifest {
    doc: XmlDocument,
    path: Option<PathBuf>,
}

impl TiappManifest {
    /// Parse manifest source text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let doc = XmlDocument::parse(text)?;
        Ok(Self { doc, path: None })
    }

    /// Load the manifest from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        debug!("loading manifest from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mut manifest = Self::parse(&text)?;
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Locate the manifest starting at `start` and load it.
    pub fn from_path(start: &Path) -> Result<Self, ManifestError> {
        let path = Self::find_manifest(start)?;
        Self::from_file(&path)
    }

    /// Search `start` (or its directory, when `start` is a file), then each
    /// successive parent directory, for [`MANIFEST_FILENAME`].
    pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
        let mut dir = if start.is_file() {
            start.parent().unwrap_or(start).to_path_buf()
        } else {
            start.to_path_buf()
        };

        loop {
            let candidate = dir.join(MANIFEST_FILENAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !dir.pop() {
                return Err(ManifestError::NotFound(start.to_path_buf()));
            }
        }
    }

    /// Path the manifest was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save back to the file the manifest was loaded from.
    pub fn save(&self) -> Result<(), ManifestError> {
        let path = self.path.as_deref().ok_or(ManifestError::NoBackingFile)?;
        self.save_to_path(path)
    }

    /// Save to a specific path with an atomic temp-file + rename write.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_xml();

        let temp_path = path.with_extension("xml.tmp");
        {
            let file = std::fs::File::create(&temp_path)?;
            let mut writer = std::io::BufWriter::new(file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
        }
        std::fs::rename(&temp_path, path)?;

        debug!("manifest saved to {}", path.display());
        Ok(())
    }

    /// Canonical re-serialization of the document.
    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    /// Declared plugins: id -> version (`latest` when unversioned).
    ///
    /// Returns an empty map when the manifest has no `<plugins>` section.
    pub fn plugins(&self) -> Result<BTreeMap<String, String>, ManifestError> {
        let mut plugins = BTreeMap::new();

        let Some(section) = self.root_section(PLUGINS_TAG)? else {
            return Ok(plugins);
        };

        for el in section.child_elements().filter(|el| el.name == PLUGIN_TAG) {
            let id = el.text().trim().to_string();
            let version = el.attr(VERSION_ATTR).unwrap_or(LATEST).to_string();
            plugins.insert(id, version);
        }

        Ok(plugins)
    }

    pub fn has_plugin(&self, id: &str) -> Result<bool, ManifestError> {
        Ok(self.plugins()?.contains_key(id))
    }

    /// Declare a plugin, creating the `<plugins>` section on demand.
    ///
    /// Returns `false` without touching the document when the plugin is
    /// already declared and no version was forced, or when the forced version
    /// equals the declared one. An omitted version is stored as `latest` and
    /// the `version` attribute is left off the written form.
    pub fn install_plugin(
        &mut self,
        id: &str,
        version: Option<&str>,
    ) -> Result<bool, ManifestError> {
        let force_version = version.is_some();
        let version = version.unwrap_or(LATEST);

        let plugins = self.plugins()?;
        if plugins.contains_key(id) && !force_version {
            return Ok(false);
        }
        if plugins.get(id).map(String::as_str) == Some(version) {
            return Ok(false);
        }

        let section = self.ensure_root_section_mut(PLUGINS_TAG)?;

        let existing = section.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) if el.name == PLUGIN_TAG && el.text().trim() == id => Some(el),
            _ => None,
        });

        if let Some(el) = existing {
            if version == LATEST {
                el.remove_attr(VERSION_ATTR);
            } else {
                el.set_attr(VERSION_ATTR, version);
            }
        } else {
            let mut el = XmlElement::new(PLUGIN_TAG);
            el.children.push(XmlNode::Text(id.to_string()));
            if version != LATEST {
                el.set_attr(VERSION_ATTR, version);
            }
            section.children.push(XmlNode::Element(el));
            section.children.push(XmlNode::Text("\n".to_string()));
        }

        debug!("installed plugin '{}' ({})", id, version);
        Ok(true)
    }

    /// Remove a plugin declaration.
    ///
    /// Returns `false` when the plugin is not declared or the manifest has no
    /// `<plugins>` section; the document is left untouched in that case.
    pub fn uninstall_plugin(&mut self, id: &str) -> Result<bool, ManifestError> {
        if self.root_section(PLUGINS_TAG)?.is_none() {
            return Ok(false);
        }

        let section = self.ensure_root_section_mut(PLUGINS_TAG)?;
        let before = section.children.len();
        section.children.retain(|node| match node {
            XmlNode::Element(el) => !(el.name == PLUGIN_TAG && el.text().trim() == id),
            _ => true,
        });

        let removed = section.children.len() != before;
        if removed {
            debug!("uninstalled plugin '{}'", id);
        }
        Ok(removed)
    }

    /// Merged module view: platform -> id -> declaration.
    ///
    /// Raw declarations sharing a (platform, id) pair collapse into one
    /// record whose deploy-type mask is the OR across the declarations;
    /// the version comes from the first declaration encountered.
    pub fn modules_index(
        &self,
    ) -> Result<BTreeMap<String, BTreeMap<String, ModuleDeclaration>>, ManifestError> {
        let mut index: BTreeMap<String, BTreeMap<String, ModuleDeclaration>> = BTreeMap::new();

        let Some(section) = self.root_section(MODULES_TAG)? else {
            return Ok(index);
        };

        for el in section.child_elements().filter(|el| el.name == MODULE_TAG) {
            let id = el.text().trim().to_string();
            let version = el.attr(VERSION_ATTR).unwrap_or(LATEST).to_string();
            let platform = el
                .attr(PLATFORM_ATTR)
                .ok_or_else(|| ManifestError::MissingPlatform(id.clone()))?
                .to_string();
            let deploy_type = el
                .attr(DEPLOY_TYPE_ATTR)
                .map(DeployType::from_str)
                .transpose()?;
            let mask = DeployTypeMask::from_declaration(deploy_type);

            match index.entry(platform.clone()).or_default().entry(id.clone()) {
                Entry::Occupied(mut occupied) => occupied.get_mut().deploy_types.merge(mask),
                Entry::Vacant(vacant) => {
                    vacant.insert(ModuleDeclaration {
                        id,
                        version,
                        platform,
                        deploy_types: mask,
                    });
                }
            }
        }

        Ok(index)
    }

    /// All merged module declarations, flattened from the index.
    pub fn all_modules(&self) -> Result<Vec<ModuleDeclaration>, ManifestError> {
        Ok(self
            .modules_index()?
            .into_values()
            .flat_map(BTreeMap::into_values)
            .collect())
    }

    /// Merged module declarations passing the query's filters.
    pub fn modules(&self, query: &ModuleQuery) -> Result<Vec<ModuleDeclaration>, ManifestError> {
        let mut modules = self.all_modules()?;
        modules.retain(|module| query.matches(module));
        Ok(modules)
    }

    /// The unique root section with the given tag, if declared.
    fn root_section(&self, name: &str) -> Result<Option<&XmlElement>, ManifestError> {
        let mut found = None;
        for el in self.doc.root.child_elements() {
            if el.name == name {
                if found.is_some() {
                    return Err(ManifestError::DuplicateSection(name.to_string()));
                }
                found = Some(el);
            }
        }
        Ok(found)
    }

    /// Mutable access to the unique root section, creating it when absent.
    fn ensure_root_section_mut(&mut self, name: &str) -> Result<&mut XmlElement, ManifestError> {
        if self.root_section(name)?.is_none() {
            self.doc
                .root
                .children
                .push(XmlNode::Element(XmlElement::new(name)));
            self.doc.root.children.push(XmlNode::Text("\n".to_string()));
        }

        self.doc
            .root
            .children
            .iter_mut()
            .find_map(|node| match node {
                XmlNode::Element(el) if el.name == name => Some(el),
                _ => None,
            })
            .ok_or_else(|| ManifestError::MissingSection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIAPP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ti:app xmlns:ti="http://ti.appcelerator.org">
    <id>com.example.demo</id>
    <plugins>
        <plugin>npmify</plugin>
        <plugin version="1.2">compiler</plugin>
    </plugins>
    <modules>
        <module platform="ios">ti.map</module>
        <module platform="ios" deploy-type="development">ti.debugtools</module>
        <module platform="ios" deploy-type="test">ti.debugtools</module>
        <module platform="android" version="2.0">ti.map</module>
    </modules>
</ti:app>
"#;

    fn manifest() -> TiappManifest {
        TiappManifest::parse(TIAPP).unwrap()
    }

    #[test]
    fn test_plugins_map() {
        let plugins = manifest().plugins().unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins.get("npmify").map(String::as_str), Some("latest"));
        assert_eq!(plugins.get("compiler").map(String::as_str), Some("1.2"));
    }

    #[test]
    fn test_plugins_empty_without_section() {
        let manifest = TiappManifest::parse("<ti:app></ti:app>").unwrap();
        assert!(manifest.plugins().unwrap().is_empty());
        assert!(!manifest.has_plugin("npmify").unwrap());
    }

    #[test]
    fn test_install_plugin_twice_is_noop() {
        let mut manifest = manifest();
        assert!(manifest.install_plugin("fresh", None).unwrap());
        let doc = manifest.to_xml();
        assert!(!manifest.install_plugin("fresh", None).unwrap());
        assert_eq!(manifest.to_xml(), doc);
    }

    #[test]
    fn test_install_plugin_version_updates() {
        let mut manifest = manifest();
        assert!(manifest.install_plugin("fresh", Some("2.0")).unwrap());
        assert!(!manifest.install_plugin("fresh", Some("2.0")).unwrap());
        assert!(manifest.install_plugin("fresh", Some("3.0")).unwrap());
        assert_eq!(
            manifest.plugins().unwrap().get("fresh").map(String::as_str),
            Some("3.0")
        );
        assert!(manifest.to_xml().contains(r#"version="3.0""#));
    }

    #[test]
    fn test_install_latest_omits_version_attribute() {
        let mut manifest = manifest();
        manifest.install_plugin("fresh", None).unwrap();
        let doc = manifest.to_xml();
        assert!(doc.contains("<plugin>fresh</plugin>"));
    }

    #[test]
    fn test_install_creates_section_on_demand() {
        let mut manifest = TiappManifest::parse("<ti:app></ti:app>").unwrap();
        assert!(manifest.install_plugin("npmify", None).unwrap());
        assert!(manifest.has_plugin("npmify").unwrap());
    }

    #[test]
    fn test_uninstall_missing_leaves_document_unchanged() {
        let mut manifest = manifest();
        let doc = manifest.to_xml();
        assert!(!manifest.uninstall_plugin("ghost").unwrap());
        assert_eq!(manifest.to_xml(), doc);
    }

    #[test]
    fn test_uninstall_removes_declaration() {
        let mut manifest = manifest();
        assert!(manifest.uninstall_plugin("npmify").unwrap());
        assert!(!manifest.has_plugin("npmify").unwrap());
        assert!(manifest.has_plugin("compiler").unwrap());
    }

    #[test]
    fn test_modules_index_merges_masks() {
        let index = manifest().modules_index().unwrap();
        let debugtools = &index["ios"]["ti.debugtools"];
        assert!(debugtools.deploy_types.development);
        assert!(debugtools.deploy_types.test);
        assert!(!debugtools.deploy_types.production);

        let map = &index["ios"]["ti.map"];
        assert_eq!(map.deploy_types, DeployTypeMask::all());
        assert_eq!(index["android"]["ti.map"].version, "2.0");
    }

    #[test]
    fn test_module_without_deploy_type_matches_every_query() {
        let manifest = manifest();
        for deploy_type in DeployType::ALL {
            let modules = manifest
                .modules(&ModuleQuery::for_build("ios", deploy_type))
                .unwrap();
            assert!(modules.iter().any(|m| m.id == "ti.map"));
        }
    }

    #[test]
    fn test_modules_query_filters() {
        let manifest = manifest();

        let ios_prod = manifest
            .modules(&ModuleQuery::for_build("ios", DeployType::Production))
            .unwrap();
        assert_eq!(ios_prod.len(), 1);
        assert_eq!(ios_prod[0].id, "ti.map");

        let ios_dev = manifest
            .modules(&ModuleQuery::for_build("ios", DeployType::Development))
            .unwrap();
        assert_eq!(ios_dev.len(), 2);

        let all = manifest.modules(&ModuleQuery::default()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_duplicate_section_is_error_at_query_not_parse() {
        let doc = r"<ti:app><plugins/><plugins/></ti:app>";
        let manifest = TiappManifest::parse(doc).unwrap();
        assert!(matches!(
            manifest.plugins(),
            Err(ManifestError::DuplicateSection(s)) if s == "plugins"
        ));
    }

    #[test]
    fn test_invalid_deploy_type_is_error() {
        let doc = r#"<ti:app><modules><module platform="ios" deploy-type="staging">m</module></modules></ti:app>"#;
        let manifest = TiappManifest::parse(doc).unwrap();
        assert!(matches!(
            manifest.modules_index(),
            Err(ManifestError::InvalidDeployType(s)) if s == "staging"
        ));
    }

    #[test]
    fn test_missing_platform_is_error() {
        let doc = r"<ti:app><modules><module>m</module></modules></ti:app>";
        let manifest = TiappManifest::parse(doc).unwrap();
        assert!(matches!(
            manifest.modules_index(),
            Err(ManifestError::MissingPlatform(s)) if s == "m"
        ));
    }

    #[test]
    fn test_roundtrip_preserves_queries() {
        let original = manifest();
        let reparsed = TiappManifest::parse(&original.to_xml()).unwrap();
        assert_eq!(original.plugins().unwrap(), reparsed.plugins().unwrap());
        assert_eq!(
            original.modules_index().unwrap(),
            reparsed.modules_index().unwrap()
        );
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), TIAPP).unwrap();
        let nested = dir.path().join("Resources").join("ios");
        std::fs::create_dir_all(&nested).unwrap();

        let found = TiappManifest::find_manifest(&nested).unwrap();
        assert_eq!(found, dir.path().join(MANIFEST_FILENAME));
    }

    #[test]
    fn test_find_manifest_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TiappManifest::find_manifest(dir.path()),
            Err(ManifestError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        std::fs::write(&path, TIAPP).unwrap();

        let mut manifest = TiappManifest::from_file(&path).unwrap();
        manifest.install_plugin("fresh", Some("2.0")).unwrap();
        manifest.save().unwrap();

        let reloaded = TiappManifest::from_file(&path).unwrap();
        assert_eq!(
            reloaded.plugins().unwrap().get("fresh").map(String::as_str),
            Some("2.0")
        );
    }
}
