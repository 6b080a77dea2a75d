//! Where the desired schema comes from.
//!
//! A [`SchemaSource`] may know about any number of configurations; a
//! synchronisation run needs exactly one. [`resolve_configuration`] enforces
//! that, while [`find_configuration`] lets callers treat "nothing configured"
//! as a normal outcome.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::{Result, SolrError};
use crate::schema::DesiredSchema;

pub trait SchemaSource: Send + Sync {
    /// Every configuration this source can see, already parsed.
    fn configurations(&self) -> Result<Vec<DesiredSchema>>;
}

/// In-memory configurations, mostly for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    schemas: Vec<DesiredSchema>,
}

impl StaticSchemaSource {
    pub fn new(schemas: Vec<DesiredSchema>) -> Self {
        Self { schemas }
    }

    pub fn single(schema: DesiredSchema) -> Self {
        Self::new(vec![schema])
    }
}

impl SchemaSource for StaticSchemaSource {
    fn configurations(&self) -> Result<Vec<DesiredSchema>> {
        Ok(self.schemas.clone())
    }
}

/// Reads YAML schema files.
///
/// The path may be a single file or a directory, in which case every `.yaml`
/// or `.yml` file directly inside it is one configuration. A path that does not
/// exist simply has no configurations.
#[derive(Debug, Clone)]
pub struct YamlSchemaSource {
    path: PathBuf,
}

impl YamlSchemaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn schema_files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Schema path does not exist");
            return Ok(Vec::new());
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let entries = fs::read_dir(&self.path).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to read schema directory");
            SolrError::Configuration(format!(
                "failed to read schema directory {}: {e}",
                self.path.display()
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    SolrError::Configuration(format!("failed to list schema directory: {e}"))
                })?
                .path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if path.is_file() && is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Parses one YAML schema document.
pub fn parse_schema_yaml(content: &str) -> Result<DesiredSchema> {
    let schema: DesiredSchema = serde_yaml::from_str(content)
        .map_err(|e| SolrError::Configuration(format!("failed to parse schema YAML: {e}")))?;
    schema.validate()?;
    Ok(schema)
}

impl SchemaSource for YamlSchemaSource {
    fn configurations(&self) -> Result<Vec<DesiredSchema>> {
        let mut schemas = Vec::new();
        for file in self.schema_files()? {
            let content = fs::read_to_string(&file).map_err(|e| {
                error!(error = ?e, path = %file.display(), "Failed to read schema file");
                SolrError::Configuration(format!("failed to read {}: {e}", file.display()))
            })?;
            let schema = parse_schema_yaml(&content).map_err(|e| {
                error!(error = %e, path = %file.display(), "Invalid schema file");
                SolrError::Configuration(format!("{}: {e}", file.display()))
            })?;
            info!(
                path = %file.display(),
                field_types = schema.field_types.len(),
                fields = schema.fields.len(),
                copy_fields = schema.copy_fields.len(),
                "Loaded schema configuration"
            );
            schemas.push(schema);
        }
        Ok(schemas)
    }
}

/// Zero configurations is `Ok(None)`; more than one is an error.
pub fn find_configuration(source: &dyn SchemaSource) -> Result<Option<DesiredSchema>> {
    let mut schemas = source.configurations()?;
    match schemas.len() {
        0 => Ok(None),
        1 => Ok(schemas.pop()),
        n => Err(SolrError::Configuration(format!(
            "found {n} schema configurations; expected exactly one"
        ))),
    }
}

/// Exactly one configuration, or a configuration error.
pub fn resolve_configuration(source: &dyn SchemaSource) -> Result<DesiredSchema> {
    find_configuration(source)?.ok_or_else(|| {
        SolrError::Configuration("no schema configuration found".to_string())
    })
}
