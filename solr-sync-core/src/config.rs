use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_SCHEMA_HANDLER: &str = "schema";
pub const DEFAULT_UPDATE_HANDLER: &str = "update";
pub const DEFAULT_CONFIG_SET: &str = "basic_configs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for one Solr core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolrConfig {
    /// Base URL, e.g. `http://localhost:8983/solr/`.
    pub url: String,
    pub collection: String,
    /// Default soft-commit window in milliseconds for updates.
    #[serde(default)]
    pub commit_within: Option<u64>,
    #[serde(default = "default_schema_handler")]
    pub schema_handler: String,
    #[serde(default = "default_update_handler")]
    pub update_handler: String,
    /// Config set used when the core has to be created.
    #[serde(default = "default_config_set")]
    pub config_set: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides applied by [`SolrConfig::for_tests`].
    #[serde(default)]
    pub test: Option<TestOverrides>,
}

/// Settings that replace the primary ones when running against a test core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestOverrides {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub commit_within: Option<u64>,
}

fn default_schema_handler() -> String {
    DEFAULT_SCHEMA_HANDLER.to_string()
}

fn default_update_handler() -> String {
    DEFAULT_UPDATE_HANDLER.to_string()
}

fn default_config_set() -> String {
    DEFAULT_CONFIG_SET.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl SolrConfig {
    pub fn new(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            collection: collection.into(),
            commit_within: None,
            schema_handler: default_schema_handler(),
            update_handler: default_update_handler(),
            config_set: default_config_set(),
            timeout_secs: default_timeout_secs(),
            test: None,
        }
    }

    /// Copy of this configuration pointed at the test core.
    ///
    /// Anything set under `test` wins; without an explicit test collection the
    /// primary collection name is prefixed with `test_`.
    pub fn for_tests(&self) -> SolrConfig {
        let overrides = self.test.clone().unwrap_or_default();
        SolrConfig {
            url: overrides.url.unwrap_or_else(|| self.url.clone()),
            collection: overrides
                .collection
                .unwrap_or_else(|| format!("test_{}", self.collection)),
            commit_within: overrides.commit_within.or(self.commit_within),
            test: None,
            ..self.clone()
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            url = %self.url,
            collection = %self.collection,
            commit_within = ?self.commit_within,
            "Loaded Solr config"
        );
        debug!(?self, "Solr config loaded (full debug)");
    }
}
