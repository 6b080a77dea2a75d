//! Schema data model: field types, fields, copy fields, and the desired schema
//! configuration that owns them.
//!
//! The structs serialize to exactly the JSON the Solr schema API accepts and
//! returns. Solr echoes field-type and analyzer arguments back as strings, so
//! desired and live definitions are compared with `same_definition`, which
//! stringifies scalar attributes on both sides first.

use std::borrow::Borrow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, SolrError};

/// A field type such as `text_en` backed by an implementation class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeDefinition {
    pub name: String,
    pub class: String,
    /// Analyzers, tokenizer settings and any other attribute Solr accepts.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Numbers and booleans as the strings Solr reports them as, recursively.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(canonical_map(map)),
        other => other.clone(),
    }
}

fn canonical_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), canonical(value)))
        .collect()
}

impl FieldTypeDefinition {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// True when `other` declares the same type, ignoring how scalar
    /// attributes are typed (`100` vs `"100"`).
    pub fn same_definition(&self, other: &FieldTypeDefinition) -> bool {
        self.name == other.name
            && self.class == other.class
            && canonical_map(&self.attributes) == canonical_map(&other.attributes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "multiValued", default, skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            multi_valued: None,
            required: None,
            stored: None,
            indexed: None,
            attributes: Map::new(),
        }
    }

    pub fn multi_valued(mut self, value: bool) -> Self {
        self.multi_valued = Some(value);
        self
    }

    pub fn required(mut self, value: bool) -> Self {
        self.required = Some(value);
        self
    }

    pub fn stored(mut self, value: bool) -> Self {
        self.stored = Some(value);
        self
    }

    pub fn indexed(mut self, value: bool) -> Self {
        self.indexed = Some(value);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn same_definition(&self, other: &FieldDefinition) -> bool {
        self.name == other.name
            && self.field_type == other.field_type
            && self.multi_valued == other.multi_valued
            && self.required == other.required
            && self.stored == other.stored
            && self.indexed == other.indexed
            && canonical_map(&self.attributes) == canonical_map(&other.attributes)
    }
}

/// Copy-field rule. Its identity is the `(source, dest)` pair; `max_chars`
/// cannot be changed in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CopyFieldDefinition {
    pub source: String,
    pub dest: String,
    #[serde(rename = "maxChars", default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<u32>,
}

impl CopyFieldDefinition {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            max_chars: None,
        }
    }

    pub fn with_max_chars(mut self, max_chars: u32) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    pub fn key(&self) -> CopyFieldKey {
        CopyFieldKey {
            source: self.source.clone(),
            dest: self.dest.clone(),
        }
    }

    /// Display name used in logs and error context.
    pub fn label(&self) -> String {
        format!("{} -> {}", self.source, self.dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CopyFieldKey {
    pub source: String,
    pub dest: String,
}

/// Objects a previous configuration declared and this one wants gone.
///
/// Only names listed here (or declared in the current configuration) may be
/// deleted from the live schema; everything else Solr reports is left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retired {
    #[serde(default)]
    pub field_types: Vec<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub copy_fields: Vec<CopyFieldKey>,
}

/// The target schema for one core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredSchema {
    #[serde(default)]
    pub field_types: Vec<FieldTypeDefinition>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub copy_fields: Vec<CopyFieldDefinition>,
    #[serde(default)]
    pub retired: Retired,
}

/// Names this tool owns for one schema category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedSet<K: Ord> {
    members: BTreeSet<K>,
}

impl<K: Ord> ManagedSet<K> {
    pub fn new(members: impl IntoIterator<Item = K>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl DesiredSchema {
    pub fn managed_field_types(&self) -> ManagedSet<String> {
        ManagedSet::new(
            self.field_types
                .iter()
                .map(|ft| ft.name.clone())
                .chain(self.retired.field_types.iter().cloned()),
        )
    }

    pub fn managed_fields(&self) -> ManagedSet<String> {
        ManagedSet::new(
            self.fields
                .iter()
                .map(|f| f.name.clone())
                .chain(self.retired.fields.iter().cloned()),
        )
    }

    pub fn managed_copy_fields(&self) -> ManagedSet<CopyFieldKey> {
        ManagedSet::new(
            self.copy_fields
                .iter()
                .map(CopyFieldDefinition::key)
                .chain(self.retired.copy_fields.iter().cloned()),
        )
    }

    /// Rejects empty names and duplicate declarations.
    pub fn validate(&self) -> Result<()> {
        let mut type_names = BTreeSet::new();
        for ft in &self.field_types {
            if ft.name.is_empty() || ft.class.is_empty() {
                return Err(SolrError::Configuration(format!(
                    "field type '{}' needs both a name and a class",
                    ft.name
                )));
            }
            if !type_names.insert(ft.name.as_str()) {
                return Err(SolrError::Configuration(format!(
                    "field type '{}' is declared more than once",
                    ft.name
                )));
            }
        }

        let mut field_names = BTreeSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.field_type.is_empty() {
                return Err(SolrError::Configuration(format!(
                    "field '{}' needs both a name and a type",
                    field.name
                )));
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(SolrError::Configuration(format!(
                    "field '{}' is declared more than once",
                    field.name
                )));
            }
        }

        let mut pairs = BTreeSet::new();
        for cf in &self.copy_fields {
            if cf.source.is_empty() || cf.dest.is_empty() {
                return Err(SolrError::Configuration(
                    "copy field needs both a source and a dest".to_string(),
                ));
            }
            if !pairs.insert(cf.key()) {
                return Err(SolrError::Configuration(format!(
                    "copy field {} is declared more than once",
                    cf.label()
                )));
            }
        }

        for name in &self.retired.field_types {
            if type_names.contains(name.as_str()) {
                return Err(SolrError::Configuration(format!(
                    "field type '{name}' is both declared and retired"
                )));
            }
        }
        for name in &self.retired.fields {
            if field_names.contains(name.as_str()) {
                return Err(SolrError::Configuration(format!(
                    "field '{name}' is both declared and retired"
                )));
            }
        }
        for key in &self.retired.copy_fields {
            if pairs.contains(key) {
                return Err(SolrError::Configuration(format!(
                    "copy field {} -> {} is both declared and retired",
                    key.source, key.dest
                )));
            }
        }
        Ok(())
    }
}

/// One mutating schema API call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaCommand<'a> {
    AddFieldType(&'a FieldTypeDefinition),
    ReplaceFieldType(&'a FieldTypeDefinition),
    DeleteFieldType(&'a str),
    AddField(&'a FieldDefinition),
    ReplaceField(&'a FieldDefinition),
    DeleteField(&'a str),
    AddCopyField(&'a CopyFieldDefinition),
    DeleteCopyField { source: &'a str, dest: &'a str },
}

impl SchemaCommand<'_> {
    /// The schema API command key, e.g. `add-field`.
    pub fn operation(&self) -> &'static str {
        match self {
            SchemaCommand::AddFieldType(_) => "add-field-type",
            SchemaCommand::ReplaceFieldType(_) => "replace-field-type",
            SchemaCommand::DeleteFieldType(_) => "delete-field-type",
            SchemaCommand::AddField(_) => "add-field",
            SchemaCommand::ReplaceField(_) => "replace-field",
            SchemaCommand::DeleteField(_) => "delete-field",
            SchemaCommand::AddCopyField(_) => "add-copy-field",
            SchemaCommand::DeleteCopyField { .. } => "delete-copy-field",
        }
    }

    /// Name of the object the command touches.
    pub fn target(&self) -> String {
        match self {
            SchemaCommand::AddFieldType(ft) | SchemaCommand::ReplaceFieldType(ft) => {
                ft.name.clone()
            }
            SchemaCommand::AddField(f) | SchemaCommand::ReplaceField(f) => f.name.clone(),
            SchemaCommand::DeleteFieldType(name) | SchemaCommand::DeleteField(name) => {
                name.to_string()
            }
            SchemaCommand::AddCopyField(cf) => cf.label(),
            SchemaCommand::DeleteCopyField { source, dest } => format!("{source} -> {dest}"),
        }
    }

    /// Request body, e.g. `{"delete-field": {"name": "title"}}`.
    pub fn body(&self) -> Result<Value> {
        let payload = match self {
            SchemaCommand::AddFieldType(ft) | SchemaCommand::ReplaceFieldType(ft) => {
                serde_json::to_value(ft)?
            }
            SchemaCommand::AddField(f) | SchemaCommand::ReplaceField(f) => {
                serde_json::to_value(f)?
            }
            SchemaCommand::DeleteFieldType(name) | SchemaCommand::DeleteField(name) => {
                json!({ "name": name })
            }
            SchemaCommand::AddCopyField(cf) => serde_json::to_value(cf)?,
            SchemaCommand::DeleteCopyField { source, dest } => {
                json!({ "source": source, "dest": dest })
            }
        };
        let mut body = Map::new();
        body.insert(self.operation().to_string(), payload);
        Ok(Value::Object(body))
    }

    /// Catches requests Solr would reject for being partial definitions.
    pub fn check(&self) -> Result<()> {
        let missing = match self {
            SchemaCommand::AddFieldType(ft) | SchemaCommand::ReplaceFieldType(ft) => {
                ft.name.is_empty() || ft.class.is_empty()
            }
            SchemaCommand::AddField(f) | SchemaCommand::ReplaceField(f) => {
                f.name.is_empty() || f.field_type.is_empty()
            }
            SchemaCommand::DeleteFieldType(name) | SchemaCommand::DeleteField(name) => {
                name.is_empty()
            }
            SchemaCommand::AddCopyField(cf) => cf.source.is_empty() || cf.dest.is_empty(),
            SchemaCommand::DeleteCopyField { source, dest } => source.is_empty() || dest.is_empty(),
        };
        if missing {
            return Err(SolrError::Usage(format!(
                "{} requires a complete definition",
                self.operation()
            )));
        }
        Ok(())
    }
}
