// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::DEFAULT_CONFIG_FILE;
use crate::config::defaults::default_config;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it:
///
/// - unknown / self `after` references,
/// - DAG cycles,
/// - watch rules naming unknown tasks,
/// - step shape and glob syntax,
/// - clean tasks ordered before tasks writing under the cleaned paths.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config for a run.
///
/// An explicitly named file must exist. When the default file name is used
/// and nothing is found, the built-in pipeline is returned instead.
pub fn resolve_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() || path != default_config_path() {
        return load_and_validate(path);
    }

    info!(
        path = %path.display(),
        "no pipeline config found; using the built-in pipeline"
    );
    default_config()
}

/// `Sitepipe.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
