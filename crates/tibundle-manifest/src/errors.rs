use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tiapp manifest operations
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("failed to parse manifest attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("manifest document has no root element")]
    EmptyDocument,

    #[error("too many <{0}/> sections under the manifest root")]
    DuplicateSection(String),

    #[error("manifest has no <{0}> section")]
    MissingSection(String),

    #[error("module '{0}' is missing the platform attribute")]
    MissingPlatform(String),

    #[error("invalid deploy-type '{0}' (expected development, test or production)")]
    InvalidDeployType(String),

    #[error("tiapp.xml not found above {}", .0.display())]
    NotFound(PathBuf),

    #[error("manifest was not loaded from a file; use save_to_path")]
    NoBackingFile,
}
