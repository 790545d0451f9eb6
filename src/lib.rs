use std::path::{Path, PathBuf};

use crate::domain::instrument::generator::{GeneratorConfig, create_config};
use crate::error::Result;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Reads the generator configuration at `config_path` and runs a full generation.
/// Returns the path of the final simulator configuration.
pub fn generate_from_config_file(config_path: impl AsRef<Path>, overwrite: bool) -> Result<PathBuf> {
    let mut config = GeneratorConfig::from_file(config_path.as_ref())?;
    log::info!("Generator configuration {} parsed successfully.", config_path.as_ref().display());

    config.overwrite |= overwrite;
    create_config(&config)
}
