use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::SolrClient;
use crate::contract::SchemaApi;
use crate::error::{Result, SolrError};
use crate::schema::{CopyFieldDefinition, FieldDefinition, FieldTypeDefinition, SchemaCommand};

/// Schema API client for the configured collection.
pub struct SchemaClient<'a> {
    client: &'a SolrClient,
    url: String,
}

impl<'a> SchemaClient<'a> {
    pub fn new(client: &'a SolrClient) -> Self {
        let url = client.build_url(&[client.collection(), &client.config().schema_handler]);
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts a single schema command.
    pub async fn post(&self, command: SchemaCommand<'_>) -> Result<()> {
        command.check()?;
        let body = command.body()?;
        debug!(operation = command.operation(), body = %body, "Posting schema command");
        let request = self.client.http().post(&self.url).json(&body);
        self.client.execute_json(command.operation(), request).await?;
        info!(
            operation = command.operation(),
            name = %command.target(),
            "[SCHEMA] Schema command applied"
        );
        Ok(())
    }

    async fn get_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.url, path);
        let request = self.client.http().get(&url).query(params);
        let body = self.client.execute_json(path, request).await?;
        let listing = body.get(key).cloned().ok_or_else(|| SolrError::Wire {
            operation: path.to_string(),
            status: 200,
            body: format!("response is missing '{key}'"),
        })?;
        Ok(serde_json::from_value(listing)?)
    }
}

#[async_trait]
impl SchemaApi for SchemaClient<'_> {
    async fn add_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()> {
        self.post(SchemaCommand::AddFieldType(field_type)).await
    }

    async fn replace_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()> {
        self.post(SchemaCommand::ReplaceFieldType(field_type)).await
    }

    async fn delete_field_type(&self, name: &str) -> Result<()> {
        self.post(SchemaCommand::DeleteFieldType(name)).await
    }

    async fn add_field(&self, field: &FieldDefinition) -> Result<()> {
        self.post(SchemaCommand::AddField(field)).await
    }

    async fn replace_field(&self, field: &FieldDefinition) -> Result<()> {
        self.post(SchemaCommand::ReplaceField(field)).await
    }

    async fn delete_field(&self, name: &str) -> Result<()> {
        self.post(SchemaCommand::DeleteField(name)).await
    }

    async fn add_copy_field(&self, copy_field: &CopyFieldDefinition) -> Result<()> {
        self.post(SchemaCommand::AddCopyField(copy_field)).await
    }

    async fn delete_copy_field(&self, source: &str, dest: &str) -> Result<()> {
        self.post(SchemaCommand::DeleteCopyField { source, dest }).await
    }

    async fn list_fields(&self, include_dynamic: bool) -> Result<Vec<FieldDefinition>> {
        self.get_listing(
            "fields",
            "fields",
            &[("includeDynamic", include_dynamic.to_string())],
        )
        .await
    }

    async fn list_field_types(&self, show_defaults: bool) -> Result<Vec<FieldTypeDefinition>> {
        self.get_listing(
            "fieldtypes",
            "fieldTypes",
            &[("showDefaults", show_defaults.to_string())],
        )
        .await
    }

    async fn list_copy_fields(&self) -> Result<Vec<CopyFieldDefinition>> {
        self.get_listing("copyfields", "copyFields", &[]).await
    }

    async fn get_schema(&self) -> Result<Value> {
        let request = self.client.http().get(&self.url);
        let body = self.client.execute_json("get-schema", request).await?;
        Ok(body.get("schema").cloned().unwrap_or(body))
    }
}
