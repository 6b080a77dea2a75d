use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::SolrClient;
use crate::contract::{Commit, Document, UpdateApi};
use crate::error::Result;

/// Update handler client. Carries the configured `commitWithin` as the
/// default commit policy for every request.
pub struct UpdateClient<'a> {
    client: &'a SolrClient,
    url: String,
    commit_within: Option<u64>,
}

impl<'a> UpdateClient<'a> {
    pub fn new(client: &'a SolrClient) -> Self {
        let url = client.build_url(&[client.collection(), &client.config().update_handler]);
        Self {
            client,
            url,
            commit_within: client.config().commit_within,
        }
    }

    /// `commit=true` and `commitWithin` are mutually exclusive; a hard commit
    /// drops the soft-commit window.
    pub fn commit_params(&self, commit: Commit) -> Vec<(&'static str, String)> {
        match commit {
            Commit::Now => vec![("commit", "true".to_string())],
            Commit::Within(ms) => vec![("commitWithin", ms.to_string())],
            Commit::Default => self
                .commit_within
                .map(|ms| ("commitWithin", ms.to_string()))
                .into_iter()
                .collect(),
        }
    }

    async fn delete(&self, target: Value) -> Result<()> {
        let body = json!({ "delete": target });
        debug!(body = %body, "Posting delete to update handler");
        let request = self
            .client
            .http()
            .post(&self.url)
            .query(&self.commit_params(Commit::Default))
            .json(&body);
        self.client.execute("delete", request).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateApi for UpdateClient<'_> {
    async fn index(&self, docs: &[Document], commit: Commit) -> Result<()> {
        let url = format!("{}/json/docs", self.url);
        let request = self
            .client
            .http()
            .post(&url)
            .query(&self.commit_params(commit))
            .json(docs);
        self.client.execute("index", request).await?;
        info!(count = docs.len(), ?commit, "[INDEX] Indexed documents");
        Ok(())
    }

    async fn delete_by_id(&self, ids: &[String]) -> Result<()> {
        self.delete(json!(ids)).await?;
        info!(count = ids.len(), "[INDEX] Deleted documents by id");
        Ok(())
    }

    async fn delete_by_query(&self, query: &str) -> Result<()> {
        self.delete(json!({ "query": query })).await?;
        info!(query, "[INDEX] Deleted documents by query");
        Ok(())
    }
}
