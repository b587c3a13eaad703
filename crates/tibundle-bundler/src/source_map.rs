//! Inline source map extraction and rewriting
//!
//! The engine appends an inline source-map comment to debug bundles. Before
//! the map can ship as a standalone artifact its `sources` entries must be
//! made relative to the project root and its `file` field pointed at the
//! final bundle path.

use crate::errors::SourceMapError;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAP_COMMENT_PREFIXES: [&str; 2] = ["//@", "//#"];
const SOURCE_MAPPING_URL: &str = "sourceMappingURL=";
const BASE64_MARKER: &str = "base64,";

/// A decoded source map. Fields other than `file`/`sources` pass through
/// untouched so rewriting never drops what the engine emitted
/// (`version`, `mappings`, `names`, `sourcesContent`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMap {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl SourceMap {
    /// Canonical textual form of the map.
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Extract the inline map from bundle text and rewrite it for emission:
/// `sources` relative to `project_dir`, `file` set to `final_bundle_path`.
pub fn extract_and_rewrite(
    bundle_text: &str,
    final_bundle_path: &str,
    project_dir: &Path,
) -> Result<SourceMap, SourceMapError> {
    let comment = find_map_comment(bundle_text).ok_or(SourceMapError::NotFound)?;
    let mut map = decode_comment(comment)?;

    map.sources = map
        .sources
        .iter()
        .map(|source| relative_to(project_dir, Path::new(source)))
        .collect();
    map.file = final_bundle_path.to_string();

    Ok(map)
}

/// The FIRST matching comment line wins: engines may embed per-module maps
/// mid-bundle, and the merged map for the whole bundle is the one the outer
/// concatenation emits ahead of them. If an engine ever guarantees the
/// merged map comes last, this needs to become a last-match scan.
fn find_map_comment(bundle_text: &str) -> Option<&str> {
    bundle_text
        .split(['\n', '\r'])
        .map(str::trim)
        .find(|line| {
            MAP_COMMENT_PREFIXES
                .iter()
                .any(|prefix| line.starts_with(prefix))
        })
}

fn decode_comment(comment: &str) -> Result<SourceMap, SourceMapError> {
    let url = comment
        .find(SOURCE_MAPPING_URL)
        .map(|idx| &comment[idx + SOURCE_MAPPING_URL.len()..])
        .ok_or(SourceMapError::MissingPayload)?;
    let payload = url
        .find(BASE64_MARKER)
        .map(|idx| &url[idx + BASE64_MARKER.len()..])
        .ok_or(SourceMapError::MissingPayload)?;

    let bytes = BASE64_STANDARD.decode(payload.trim_end())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Express `path` relative to `base`, with forward slashes as maps use.
///
/// Non-absolute entries (the prelude path, already-relative sources) pass
/// through unchanged; entries outside `base` gain `..` components. Both
/// paths are expected to be absolute for the `..` arithmetic to hold.
pub fn relative_to(base: &Path, path: &Path) -> String {
    if !path.is_absolute() {
        return path.to_string_lossy().into_owned();
    }

    let base_components: Vec<_> = base.components().collect();
    let path_components: Vec<_> = path.components().collect();

    let mut common = 0;
    while common < base_components.len()
        && common < path_components.len()
        && base_components[common] == path_components[common]
    {
        common += 1;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_components.len() {
        parts.push("..".to_string());
    }
    for component in &path_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    parts.join("/")
}

/// Build an inline map comment for a map payload (test and tooling helper).
pub fn to_comment(map_json: &str) -> String {
    format!(
        "//# sourceMappingURL=data:application/json;base64,{}",
        BASE64_STANDARD.encode(map_json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_with_map(map_json: &str) -> String {
        format!("var x = 1;\n{}\n", to_comment(map_json))
    }

    #[test]
    fn test_extract_rewrites_sources_and_file() {
        let map_json = r#"{"version":3,"file":"generated.js","sources":["/p/src/a.js","/p/lib/b.js"],"mappings":"AAAA","names":[]}"#;
        let bundle = bundle_with_map(map_json);

        let map =
            extract_and_rewrite(&bundle, "Resources/ios/bundle.js.js", Path::new("/p")).unwrap();

        assert_eq!(map.file, "Resources/ios/bundle.js.js");
        assert_eq!(
            map.sources,
            vec!["src/a.js".to_string(), "lib/b.js".to_string()]
        );
        assert_eq!(
            map.rest.get("mappings"),
            Some(&serde_json::Value::String("AAAA".to_string()))
        );
    }

    #[test]
    fn test_missing_map_is_not_found() {
        assert!(matches!(
            extract_and_rewrite("var x = 1;\n", "bundle.js", Path::new("/p")),
            Err(SourceMapError::NotFound)
        ));
    }

    #[test]
    fn test_first_comment_wins() {
        let inner = r#"{"version":3,"file":"inner.js","sources":["/p/inner.js"],"mappings":""}"#;
        let outer = r#"{"version":3,"file":"outer.js","sources":["/p/outer.js"],"mappings":""}"#;
        let bundle = format!(
            "{}\nvar mid = 1;\n{}\n",
            to_comment(outer),
            to_comment(inner)
        );

        let map = extract_and_rewrite(&bundle, "bundle.js", Path::new("/p")).unwrap();
        assert_eq!(map.sources, vec!["outer.js".to_string()]);
    }

    #[test]
    fn test_legacy_at_prefix_recognized() {
        let map_json = r#"{"version":3,"sources":["/p/a.js"],"mappings":""}"#;
        let comment = format!(
            "//@ sourceMappingURL=data:application/json;base64,{}",
            BASE64_STANDARD.encode(map_json)
        );
        let bundle = format!("var x = 1;\n{}\n", comment);

        let map = extract_and_rewrite(&bundle, "bundle.js", Path::new("/p")).unwrap();
        assert_eq!(map.sources, vec!["a.js".to_string()]);
    }

    #[test]
    fn test_non_base64_payload_is_decode_error() {
        let bundle = "//# sourceMappingURL=bundle.js.map\n";
        assert!(matches!(
            extract_and_rewrite(bundle, "bundle.js", Path::new("/p")),
            Err(SourceMapError::MissingPayload)
        ));
    }

    #[test]
    fn test_bad_json_payload_is_decode_error() {
        let comment = format!(
            "//# sourceMappingURL=data:application/json;base64,{}",
            BASE64_STANDARD.encode("{not json")
        );
        let bundle = format!("x;\n{}\n", comment);
        assert!(matches!(
            extract_and_rewrite(&bundle, "bundle.js", Path::new("/p")),
            Err(SourceMapError::Json(_))
        ));
    }

    #[test]
    fn test_relative_to_inside_and_outside_root() {
        assert_eq!(relative_to(Path::new("/p"), Path::new("/p/src/a.js")), "src/a.js");
        assert_eq!(relative_to(Path::new("/p"), Path::new("/q/b.js")), "../q/b.js");
        assert_eq!(
            relative_to(Path::new("/p"), Path::new("build/map/prelude.js")),
            "build/map/prelude.js"
        );
    }
}
