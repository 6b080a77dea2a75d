//! # contract: interfaces between the core logic and a Solr deployment
//!
//! The reconciler, the indexer and the test-core helpers only ever talk to Solr
//! through the traits in this module. [`crate::client`] implements them over
//! HTTP; tests use the `mockall` mocks generated here or in-memory fakes.
//!
//! Every method is a single request/response round trip. Callers await each
//! one before issuing the next, so implementations need no internal ordering
//! guarantees of their own.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::schema::{CopyFieldDefinition, FieldDefinition, FieldTypeDefinition};

/// A document as submitted to the update handler.
pub type Document = Map<String, Value>;

/// Schema API of one core.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SchemaApi: Send + Sync {
    async fn add_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()>;

    /// Replace requires the full definition; Solr has no partial updates.
    async fn replace_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()>;

    async fn delete_field_type(&self, name: &str) -> Result<()>;

    async fn add_field(&self, field: &FieldDefinition) -> Result<()>;

    /// Replace requires the full definition; Solr has no partial updates.
    async fn replace_field(&self, field: &FieldDefinition) -> Result<()>;

    async fn delete_field(&self, name: &str) -> Result<()>;

    async fn add_copy_field(&self, copy_field: &CopyFieldDefinition) -> Result<()>;

    async fn delete_copy_field(&self, source: &str, dest: &str) -> Result<()>;

    async fn list_fields(&self, include_dynamic: bool) -> Result<Vec<FieldDefinition>>;

    async fn list_field_types(&self, show_defaults: bool) -> Result<Vec<FieldTypeDefinition>>;

    async fn list_copy_fields(&self) -> Result<Vec<CopyFieldDefinition>>;

    /// The full schema document as Solr reports it.
    async fn get_schema(&self) -> Result<Value>;
}

/// When submitted documents become visible to searchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Commit {
    /// Use the client's configured `commitWithin`, if any.
    #[default]
    Default,
    /// Soft commit within the given number of milliseconds.
    Within(u64),
    /// Hard commit as part of the request.
    Now,
}

/// Update API of one core.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait UpdateApi: Send + Sync {
    async fn index(&self, docs: &[Document], commit: Commit) -> Result<()>;

    async fn delete_by_id(&self, ids: &[String]) -> Result<()>;

    async fn delete_by_query(&self, query: &str) -> Result<()>;
}

/// Status block returned by the core admin STATUS action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoreStatus {
    #[serde(default)]
    pub status: Map<String, Value>,
}

impl CoreStatus {
    /// A core that does not exist comes back as an empty object.
    pub fn is_loaded(&self, core: &str) -> bool {
        self.status
            .get(core)
            .and_then(Value::as_object)
            .is_some_and(|entry| !entry.is_empty())
    }
}

/// What UNLOAD removes from disk along with the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnloadOptions {
    pub delete_instance_dir: bool,
    pub delete_index: bool,
    pub delete_data_dir: bool,
}

impl UnloadOptions {
    pub fn everything() -> Self {
        Self {
            delete_instance_dir: true,
            delete_index: true,
            delete_data_dir: true,
        }
    }
}

/// Core lifecycle administration.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CoreAdminApi: Send + Sync {
    /// True when the core answers its ping handler.
    async fn ping(&self, core: &str) -> Result<bool>;

    async fn status(&self, core: &str) -> Result<CoreStatus>;

    async fn create(&self, core: &str, config_set: &str) -> Result<()>;

    async fn reload(&self, core: &str) -> Result<()>;

    async fn unload(&self, core: &str, options: UnloadOptions) -> Result<()>;
}

/// Receives one notification per submitted chunk.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ProgressSink: Send + Sync {
    fn update(&self, increment: usize);
}
