//! Tool configuration and project descriptor handling
//!
//! Two configuration surfaces feed the bundling pipeline: the user-level
//! tool config (engine location, target -> deploy-type remapping) and the
//! per-project `package.json` descriptor (export name, bundle options).

pub mod config;
pub mod descriptor;
pub mod errors;

pub use config::{Config, DeployTargetMap, CONFIG_ENV, DEFAULT_ENGINE};
pub use descriptor::{
    BundleOptions, PackageDescriptor, ResolvedBundleOptions, DESCRIPTOR_FILENAME,
};
pub use errors::ConfigError;
