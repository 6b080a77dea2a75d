use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::SolrClient;
use crate::contract::{CoreAdminApi, CoreStatus, UnloadOptions};
use crate::error::{Result, SolrError};

/// Client for `<base>/admin/cores` and per-core ping.
pub struct CoreAdminClient<'a> {
    client: &'a SolrClient,
    url: String,
}

impl<'a> CoreAdminClient<'a> {
    pub fn new(client: &'a SolrClient) -> Self {
        let url = client.build_url(&["admin", "cores"]);
        Self { client, url }
    }

    async fn action(&self, action: &str, params: &[(&str, String)]) -> Result<Value> {
        let request = self
            .client
            .http()
            .get(&self.url)
            .query(&[("action", action), ("wt", "json")])
            .query(params);
        self.client.execute_json(action, request).await
    }
}

#[async_trait]
impl CoreAdminApi for CoreAdminClient<'_> {
    async fn ping(&self, core: &str) -> Result<bool> {
        let url = self.client.build_url(&[core, "admin", "ping"]);
        let response = self
            .client
            .http()
            .get(&url)
            .query(&[("wt", "json")])
            .send()
            .await
            .map_err(|e| SolrError::from_transport(&self.client.config().url, e))?;

        if !response.status().is_success() {
            warn!(core, status = response.status().as_u16(), "[CORE] Ping failed");
            return Ok(false);
        }
        let body: Value = response.json().await?;
        Ok(body.get("status").and_then(Value::as_str) == Some("OK"))
    }

    async fn status(&self, core: &str) -> Result<CoreStatus> {
        let body = self.action("STATUS", &[("core", core.to_string())]).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn create(&self, core: &str, config_set: &str) -> Result<()> {
        info!(core, config_set, "[CORE] Creating core");
        self.action(
            "CREATE",
            &[
                ("name", core.to_string()),
                ("configSet", config_set.to_string()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn reload(&self, core: &str) -> Result<()> {
        info!(core, "[CORE] Reloading core");
        self.action("RELOAD", &[("core", core.to_string())]).await?;
        Ok(())
    }

    async fn unload(&self, core: &str, options: UnloadOptions) -> Result<()> {
        info!(core, ?options, "[CORE] Unloading core");
        self.action(
            "UNLOAD",
            &[
                ("core", core.to_string()),
                ("deleteInstanceDir", options.delete_instance_dir.to_string()),
                ("deleteIndex", options.delete_index.to_string()),
                ("deleteDataDir", options.delete_data_dir.to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}
