//! `load_config`: reads the CLI's YAML configuration file.
//!
//! The file carries the Solr connection settings and the location of the
//! desired schema. Connection settings can be overridden from the environment
//! (`SOLR_URL`, `SOLR_COLLECTION`), which `main` populates from `.env` first.
//!
//! A relative `schema` path is resolved against the directory holding the
//! config file, so the CLI behaves the same from any working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use solr_sync_core::config::SolrConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const SOLR_URL_ENV: &str = "SOLR_URL";
pub const SOLR_COLLECTION_ENV: &str = "SOLR_COLLECTION";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub solr: SolrConfig,
    /// Schema file, or directory of schema files.
    pub schema: PathBuf,
}

impl AppConfig {
    pub fn trace_loaded(&self) {
        self.solr.trace_loaded();
        info!(schema = %self.schema.display(), "Desired schema location");
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let mut config: AppConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config YAML {:?}", path_ref))?;

    if let Some(url) = env_override(SOLR_URL_ENV) {
        info!(env = SOLR_URL_ENV, "Overriding Solr URL from environment");
        config.solr.url = url;
    }
    if let Some(collection) = env_override(SOLR_COLLECTION_ENV) {
        info!(env = SOLR_COLLECTION_ENV, "Overriding Solr collection from environment");
        config.solr.collection = collection;
    }

    if config.schema.is_relative() {
        if let Some(dir) = path_ref.parent() {
            config.schema = dir.join(&config.schema);
        }
    }

    config.trace_loaded();
    Ok(config)
}
