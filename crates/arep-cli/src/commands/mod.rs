//! Subcommand implementations.

pub mod config;
pub mod extract;
pub mod year;

use std::path::Path;

use arep_core::ArepConfig;

/// Load the configuration named on the command line, else the user config
/// file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ArepConfig> {
    if let Some(path) = config_path {
        return Ok(ArepConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(ArepConfig::from_file(&default_path)?)
    } else {
        Ok(ArepConfig::default())
    }
}
