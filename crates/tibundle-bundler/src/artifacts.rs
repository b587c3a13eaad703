//! Output artifact emission
//!
//! A build persists five files under the project root: the empty app entry
//! script, the bundle, the runtime preamble, the rewritten map, and the
//! one-line platform loader. Directory creation is idempotent; the file
//! writes are independent and all overwrite, so re-running a failed build
//! converges without cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of the placeholder app entry script.
pub const EMPTY_SRC: &str = "";

/// Contents of the platform app entry: defer to the bundle.
pub const APP_SRC: &str = "require('bundle');";

/// Runtime preamble injected at the top of every bundle.
pub const PRELUDE_SRC: &str = include_str!("../assets/prelude.js");

/// Path recorded for the preamble in generated maps.
pub const PRELUDE_PATH: &str = "build/map/prelude.js";

/// Path recorded in the map's `file` field for one platform.
pub fn map_file_target(platform: &str) -> String {
    format!("Resources/{}/bundle.js.js", platform)
}

/// The files one build emits, all relative to the project root on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// `Resources/app.js`, intentionally empty.
    pub app_entry: PathBuf,
    /// `Resources/<platform>/bundle.js`.
    pub bundle: PathBuf,
    /// `Resources/<platform>/app.js`, the loader line.
    pub platform_app_entry: PathBuf,
    /// `build/map/prelude.js`.
    pub prelude: PathBuf,
    /// `build/map/Resources/<platform>/bundle.js.map`.
    pub map: PathBuf,
}

impl BuildOutput {
    /// All emitted paths, in write order.
    pub fn paths(&self) -> [&Path; 5] {
        [
            &self.app_entry,
            &self.bundle,
            &self.prelude,
            &self.map,
            &self.platform_app_entry,
        ]
    }
}

/// Ensure the output directories exist and write the artifact set.
pub fn write_artifacts(
    project_dir: &Path,
    platform: &str,
    bundle_text: &str,
    map_json: &str,
) -> Result<BuildOutput, io::Error> {
    let resources = project_dir.join("Resources");
    let platform_resources = resources.join(platform);
    let map_root = project_dir.join("build").join("map");
    let platform_map = map_root.join("Resources").join(platform);

    fs::create_dir_all(&platform_resources)?;
    fs::create_dir_all(&platform_map)?;

    let output = BuildOutput {
        app_entry: resources.join("app.js"),
        bundle: platform_resources.join("bundle.js"),
        platform_app_entry: platform_resources.join("app.js"),
        prelude: map_root.join("prelude.js"),
        map: platform_map.join("bundle.js.map"),
    };

    fs::write(&output.app_entry, EMPTY_SRC)?;
    fs::write(&output.bundle, bundle_text)?;
    fs::write(&output.prelude, PRELUDE_SRC)?;
    fs::write(&output.map, map_json)?;
    fs::write(&output.platform_app_entry, APP_SRC)?;

    debug!("wrote artifact set under {}", project_dir.display());
    Ok(output)
}
