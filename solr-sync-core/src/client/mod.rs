//! HTTP implementations of the [`crate::contract`] traits.
//!
//! [`SolrClient`] owns the `reqwest` client and the connection settings. The
//! schema, update and core admin clients borrow it, so one connection pool is
//! shared by every call made during a run.

mod core_admin;
mod schema;
mod update;

pub use core_admin::CoreAdminClient;
pub use schema::SchemaClient;
pub use update::UpdateClient;

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::SolrConfig;
use crate::error::{Result, SolrError};

pub struct SolrClient {
    http: reqwest::Client,
    config: SolrConfig,
}

impl SolrClient {
    pub fn new(config: SolrConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!(
            url = %config.url,
            collection = %config.collection,
            "Initialized Solr client"
        );
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SolrConfig {
        &self.config
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    pub fn schema(&self) -> SchemaClient<'_> {
        SchemaClient::new(self)
    }

    pub fn update(&self) -> UpdateClient<'_> {
        UpdateClient::new(self)
    }

    pub fn core_admin(&self) -> CoreAdminClient<'_> {
        CoreAdminClient::new(self)
    }

    /// Joins path segments onto the base URL without doubling slashes.
    pub fn build_url(&self, segments: &[&str]) -> String {
        let mut url = self.config.url.trim_end_matches('/').to_string();
        for segment in segments {
            let segment = segment.trim_matches('/');
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends a request and turns transport failures and non-2xx statuses into
    /// [`SolrError`]s tagged with `operation`.
    pub(crate) async fn execute(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| SolrError::from_transport(&self.config.url, e))?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), url = %response.url(), "Solr responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                operation,
                status = status.as_u16(),
                body = %body,
                "Solr returned an error status"
            );
            return Err(SolrError::Wire {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Like [`execute`](Self::execute) but decodes the body, treating an
    /// `errors` array in a 2xx response as a failure too.
    pub(crate) async fn execute_json(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Value> {
        let response = self.execute(operation, request).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
            error!(operation, errors = %errors, "Solr reported errors in a successful response");
            return Err(SolrError::Wire {
                operation: operation.to_string(),
                status,
                body: errors.to_string(),
            });
        }
        Ok(body)
    }
}
