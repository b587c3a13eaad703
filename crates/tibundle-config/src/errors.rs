use std::io;
use thiserror::Error;

/// Errors that can occur during configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to parse package descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("no bundler engine found; set `engine` in the config or install '{0}' on PATH")]
    EngineNotFound(String),

    #[error("could not determine the config directory")]
    NoConfigDir,
}
