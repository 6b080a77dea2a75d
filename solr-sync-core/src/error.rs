//! Error type shared by the wire clients, the reconciler and the indexer.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolrError>;

/// Reconciliation phase an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FieldTypes,
    Fields,
    CopyFields,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::FieldTypes => "field types",
            Phase::Fields => "fields",
            Phase::CopyFields => "copy fields",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum SolrError {
    /// Desired schema could not be resolved to exactly one valid configuration.
    #[error("schema configuration error: {0}")]
    Configuration(String),

    #[error("Error connecting to Solr at {url}. Check your configuration and make sure Solr is running.")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {body}")]
    Wire {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{phase}: {operation} '{name}' failed: {source}")]
    Apply {
        phase: Phase,
        operation: &'static str,
        name: String,
        #[source]
        source: Box<SolrError>,
    },

    #[error("invalid request: {0}")]
    Usage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SolrError {
    /// Returns true when the engine could not be reached at all.
    pub fn is_connection(&self) -> bool {
        match self {
            SolrError::Connection { .. } => true,
            SolrError::Apply { source, .. } => source.is_connection(),
            _ => false,
        }
    }

    pub(crate) fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SolrError::Connection {
                url: url.to_string(),
                source: err,
            }
        } else {
            SolrError::Http(err)
        }
    }
}
