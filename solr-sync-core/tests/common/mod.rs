//! In-memory stand-ins for a Solr core, shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};
use solr_sync_core::contract::{Commit, Document, SchemaApi, UpdateApi};
use solr_sync_core::error::{Result, SolrError};
use solr_sync_core::schema::{CopyFieldDefinition, FieldDefinition, FieldTypeDefinition};

#[derive(Default)]
struct SchemaState {
    field_types: Vec<FieldTypeDefinition>,
    fields: Vec<FieldDefinition>,
    copy_fields: Vec<CopyFieldDefinition>,
    calls: Vec<String>,
    fail_on: Option<String>,
}

/// Behaves like a core's schema API: adding an existing name, or replacing
/// or deleting a missing one, is rejected the way Solr rejects it.
#[derive(Default)]
pub struct InMemorySchema {
    state: Mutex<SchemaState>,
}

fn rejected(operation: &str, message: String) -> SolrError {
    SolrError::Wire {
        operation: operation.to_string(),
        status: 400,
        body: message,
    }
}

impl InMemorySchema {
    pub fn new(
        field_types: Vec<FieldTypeDefinition>,
        fields: Vec<FieldDefinition>,
        copy_fields: Vec<CopyFieldDefinition>,
    ) -> Self {
        Self {
            state: Mutex::new(SchemaState {
                field_types,
                fields,
                copy_fields,
                ..Default::default()
            }),
        }
    }

    /// Makes the call logged as `call` (e.g. `add-field:title`) fail.
    pub fn fail_on(self, call: &str) -> Self {
        self.state.lock().unwrap().fail_on = Some(call.to_string());
        self
    }

    /// Mutating calls in the order they arrived, as `operation:name`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn field_types(&self) -> Vec<FieldTypeDefinition> {
        self.state.lock().unwrap().field_types.clone()
    }

    pub fn fields(&self) -> Vec<FieldDefinition> {
        self.state.lock().unwrap().fields.clone()
    }

    pub fn copy_fields(&self) -> Vec<CopyFieldDefinition> {
        self.state.lock().unwrap().copy_fields.clone()
    }

    fn record(&self, operation: &str, name: &str) -> Result<MutexGuard<'_, SchemaState>> {
        let mut state = self.state.lock().unwrap();
        let call = format!("{operation}:{name}");
        if state.fail_on.as_deref() == Some(call.as_str()) {
            return Err(rejected(operation, format!("injected failure for {name}")));
        }
        state.calls.push(call);
        Ok(state)
    }
}

#[async_trait]
impl SchemaApi for InMemorySchema {
    async fn add_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()> {
        let mut state = self.record("add-field-type", &field_type.name)?;
        if state.field_types.iter().any(|ft| ft.name == field_type.name) {
            return Err(rejected("add-field-type", format!("{} already exists", field_type.name)));
        }
        state.field_types.push(field_type.clone());
        Ok(())
    }

    async fn replace_field_type(&self, field_type: &FieldTypeDefinition) -> Result<()> {
        let mut state = self.record("replace-field-type", &field_type.name)?;
        match state.field_types.iter_mut().find(|ft| ft.name == field_type.name) {
            Some(existing) => {
                *existing = field_type.clone();
                Ok(())
            }
            None => Err(rejected("replace-field-type", format!("{} not found", field_type.name))),
        }
    }

    async fn delete_field_type(&self, name: &str) -> Result<()> {
        let mut state = self.record("delete-field-type", name)?;
        if state.fields.iter().any(|f| f.field_type == name) {
            return Err(rejected("delete-field-type", format!("{name} is still in use")));
        }
        let before = state.field_types.len();
        state.field_types.retain(|ft| ft.name != name);
        if state.field_types.len() == before {
            return Err(rejected("delete-field-type", format!("{name} not found")));
        }
        Ok(())
    }

    async fn add_field(&self, field: &FieldDefinition) -> Result<()> {
        let mut state = self.record("add-field", &field.name)?;
        if state.fields.iter().any(|f| f.name == field.name) {
            return Err(rejected("add-field", format!("{} already exists", field.name)));
        }
        if !state.field_types.iter().any(|ft| ft.name == field.field_type) {
            return Err(rejected("add-field", format!("unknown type {}", field.field_type)));
        }
        state.fields.push(field.clone());
        Ok(())
    }

    async fn replace_field(&self, field: &FieldDefinition) -> Result<()> {
        let mut state = self.record("replace-field", &field.name)?;
        match state.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => {
                *existing = field.clone();
                Ok(())
            }
            None => Err(rejected("replace-field", format!("{} not found", field.name))),
        }
    }

    async fn delete_field(&self, name: &str) -> Result<()> {
        let mut state = self.record("delete-field", name)?;
        let before = state.fields.len();
        state.fields.retain(|f| f.name != name);
        if state.fields.len() == before {
            return Err(rejected("delete-field", format!("{name} not found")));
        }
        Ok(())
    }

    async fn add_copy_field(&self, copy_field: &CopyFieldDefinition) -> Result<()> {
        let mut state = self.record("add-copy-field", &copy_field.label())?;
        state.copy_fields.push(copy_field.clone());
        Ok(())
    }

    async fn delete_copy_field(&self, source: &str, dest: &str) -> Result<()> {
        let mut state = self.record("delete-copy-field", &format!("{source} -> {dest}"))?;
        let before = state.copy_fields.len();
        state
            .copy_fields
            .retain(|cf| !(cf.source == source && cf.dest == dest));
        if state.copy_fields.len() == before {
            return Err(rejected("delete-copy-field", format!("{source} -> {dest} not found")));
        }
        Ok(())
    }

    async fn list_fields(&self, _include_dynamic: bool) -> Result<Vec<FieldDefinition>> {
        Ok(self.fields())
    }

    async fn list_field_types(&self, _show_defaults: bool) -> Result<Vec<FieldTypeDefinition>> {
        Ok(self.field_types())
    }

    async fn list_copy_fields(&self) -> Result<Vec<CopyFieldDefinition>> {
        Ok(self.copy_fields())
    }

    async fn get_schema(&self) -> Result<Value> {
        Ok(json!({
            "fieldTypes": self.field_types(),
            "fields": self.fields(),
            "copyFields": self.copy_fields(),
        }))
    }
}

/// Records every update request.
#[derive(Default)]
pub struct RecordingUpdate {
    batches: Mutex<Vec<Vec<Document>>>,
    deleted_ids: Mutex<Vec<Vec<String>>>,
    queries: Mutex<Vec<String>>,
    fail_on_batch: Option<usize>,
}

impl RecordingUpdate {
    pub fn failing_on_batch(index: usize) -> Self {
        Self {
            fail_on_batch: Some(index),
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<Document>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    pub fn deleted_ids(&self) -> Vec<Vec<String>> {
        self.deleted_ids.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateApi for RecordingUpdate {
    async fn index(&self, docs: &[Document], _commit: Commit) -> Result<()> {
        let mut batches = self.batches.lock().unwrap();
        if self.fail_on_batch == Some(batches.len()) {
            return Err(rejected("index", "injected failure".to_string()));
        }
        batches.push(docs.to_vec());
        Ok(())
    }

    async fn delete_by_id(&self, ids: &[String]) -> Result<()> {
        self.deleted_ids.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    async fn delete_by_query(&self, query: &str) -> Result<()> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(())
    }
}
