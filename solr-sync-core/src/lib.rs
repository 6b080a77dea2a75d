#![doc = "solr-sync-core: schema reconciliation and bulk indexing for Solr cores."]

//! The library behind the `solr-sync` CLI.
//!
//! - [`reconcile`] diffs a desired schema against a live core and applies the
//!   minimal set of schema API calls.
//! - [`indexing`] submits documents in bounded chunks.
//! - [`client`] talks HTTP to Solr; everything else only sees the traits in
//!   [`contract`].
//!
//! # Usage
//! ```no_run
//! # async fn run() -> solr_sync_core::error::Result<()> {
//! use solr_sync_core::{client::SolrClient, config::SolrConfig};
//! use solr_sync_core::schema_source::YamlSchemaSource;
//!
//! let client = SolrClient::new(SolrConfig::new("http://localhost:8983/solr/", "myproj"))?;
//! let source = YamlSchemaSource::new("schema.yaml");
//! let report = solr_sync_core::reconcile::synchronize(&source, &client.schema()).await?;
//! for line in report.summary() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod indexing;
pub mod reconcile;
pub mod schema;
pub mod schema_source;
pub mod test_core;

pub use error::{Result, SolrError};
