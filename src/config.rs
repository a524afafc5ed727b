//! Configuration file loading
//!
//! The configuration carries ordered category rules and a blacklist. The
//! format is picked from the extension: `.json`, `.toml`, anything else YAML.

use crate::domain::{Blacklist, CategoryRule};
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".pinbump.yaml";

/// Loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Ordered category rules
    pub categories: Vec<CategoryRule>,
    /// Exclusion filters
    pub blacklist: Blacklist,
}

/// On-disk shape; every section is optional
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    categories: Option<Vec<RawCategory>>,
    #[serde(default)]
    blacklist: Option<Blacklist>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    repo_patterns: Vec<String>,
    #[serde(default)]
    module_patterns: Vec<String>,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let categories = raw
            .categories
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let name = entry.name.filter(|n| !n.is_empty())?;
                Some(
                    CategoryRule::new(name)
                        .with_repo_patterns(entry.repo_patterns)
                        .with_module_patterns(entry.module_patterns),
                )
            })
            .collect();

        Self {
            categories,
            blacklist: raw.blacklist.unwrap_or_default(),
        }
    }
}

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

/// Resolve `path` against `root` unless it is absolute
pub fn resolve_config_path(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Load the configuration at `path` (relative paths are taken from `root`)
///
/// A missing file, or an empty `path`, yields the default configuration.
pub fn load_config(path: &Path, root: &Path) -> Result<Config, ConfigError> {
    if path.as_os_str().is_empty() {
        return Ok(Config::default());
    }

    let path = resolve_config_path(path, root);
    if !path.is_file() {
        debug!("config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        source: e,
    })?;

    let config = parse_config(&content, Format::from_path(&path), &path)?;
    debug!(
        "loaded {} category rule(s) from {}",
        config.categories.len(),
        path.display()
    );
    Ok(config)
}

fn parse_config(content: &str, format: Format, path: &Path) -> Result<Config, ConfigError> {
    let raw: RawConfig = match format {
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).map_err(|e| ConfigError::parse(path, e.to_string()))?;
            if !value.is_object() {
                return Ok(Config::default());
            }
            serde_json::from_value(value).map_err(|e| ConfigError::parse(path, e.to_string()))?
        }
        Format::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::parse(path, e.to_string()))?
        }
        Format::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| ConfigError::parse(path, e.to_string()))?;
            if !value.is_mapping() {
                return Ok(Config::default());
            }
            serde_yaml::from_value(value).map_err(|e| ConfigError::parse(path, e.to_string()))?
        }
    };

    Ok(raw.into())
}
