use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::OutlinerConfig;

pub const CONFIG_FILE: &str = "outliner.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse outliner.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Read `outliner.toml` from `dir`. A missing file yields the defaults.
pub fn read_config(dir: &Path) -> Result<OutlinerConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(OutlinerConfig::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}
