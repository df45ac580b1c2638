//! Configuration loading.
//!
//! TaggerDB runs with built-in defaults; a TOML file passed with `--config`
//! can set the catalog location, a default storage root, and scan policy.
//! Command-line flags always win over file values.
//!
//! ```toml
//! [catalog]
//! path = "tagger.db3"
//!
//! [scan]
//! root = "/srv/storage"
//! follow_symlinks = false
//! exclude_globs = ["**/.git/**"]
//! ```

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default catalog file name, relative to the working directory.
pub const DEFAULT_CATALOG: &str = "tagger.db3";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG)
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScanConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Config {
    /// Apply command-line overrides on top of file or default values.
    pub fn with_overrides(mut self, database: Option<PathBuf>, directory: Option<PathBuf>) -> Self {
        if let Some(path) = database {
            self.catalog.path = path;
        }
        if let Some(root) = directory {
            self.scan.root = Some(root);
        }
        self
    }

    /// The storage root to scan, or an error if none was configured.
    pub fn storage_root(&self) -> Result<&Path, ConfigError> {
        self.scan.root.as_deref().ok_or(ConfigError::StorageUnset)
    }
}

/// Load configuration from `path`, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.catalog.path.as_os_str().is_empty() {
        anyhow::bail!("catalog.path must not be empty");
    }

    build_globset(&config.scan.exclude_globs)?;

    Ok(config)
}

/// Compile exclude patterns into a single matcher.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}
