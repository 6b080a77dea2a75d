//! CLI interface for solr-sync: argument parsing and orchestration.
//!
//! All schema and indexing logic lives in `solr-sync-core`; this module wires
//! the configuration, the Solr client and the user's terminal together.

use crate::load_config::load_config;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use solr_sync_core::client::SolrClient;
use solr_sync_core::contract::CoreAdminApi;
use solr_sync_core::reconcile::apply_schema;
use solr_sync_core::schema_source::{resolve_configuration, YamlSchemaSource};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

/// Keeps a Solr core's schema in line with a declared configuration.
#[derive(Parser)]
#[clap(
    name = "solr-sync",
    version,
    about = "Reconcile a Solr core's managed schema with a declared configuration"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the core if needed, apply the desired schema and reload the core
    Schema {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Never prompt; create a missing core without asking
        #[clap(long)]
        noinput: bool,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Schema { config, noinput } => {
            let stdin = io::stdin();
            let mut confirm = |question: &str| ask(question, &mut stdin.lock(), &mut io::stdout());
            schema_command(config, noinput, &mut io::stdout(), &mut confirm).await
        }
    }
}

/// Prints `question` and reads a y/n answer.
fn ask(question: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{question} (y/n) ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Runs the `schema` subcommand, writing the change report to `out`.
///
/// `confirm` is asked before a missing core is created unless `noinput` is
/// set. Declining ends the command without an error.
pub async fn schema_command(
    config_path: PathBuf,
    noinput: bool,
    out: &mut impl Write,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<()> {
    let config = load_config(&config_path)?;
    let desired = resolve_configuration(&YamlSchemaSource::new(&config.schema))
        .with_context(|| format!("Invalid schema configuration at {}", config.schema.display()))?;

    let client = SolrClient::new(config.solr.clone())?;
    let core = client.collection().to_string();
    let admin = client.core_admin();

    let alive = admin.ping(&core).await?;
    if !alive {
        let create = noinput || confirm(&format!("Solr core {core} does not exist. Create it?"))?;
        if !create {
            info!(core = %core, "[CORE] Core creation declined, nothing to do");
            return Ok(());
        }
        admin.create(&core, &config.solr.config_set).await?;
        writeln!(out, "Created Solr core {core}")?;
    }

    let report = match apply_schema(&desired, &client.schema()).await {
        Ok(report) => report,
        Err(e) => {
            error!(core = %core, error = %e, "[SCHEMA][ERROR] Schema synchronisation failed");
            bail!(e);
        }
    };
    for line in report.summary() {
        writeln!(out, "{line}")?;
    }

    admin.reload(&core).await?;
    info!(core = %core, ?report, "[SCHEMA] Schema command complete");
    Ok(())
}
