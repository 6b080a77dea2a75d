//! Throwaway cores for integration tests.
//!
//! A test run points [`crate::config::SolrConfig::for_tests`] at its own core,
//! calls [`prepare_test_core`] once up front and [`teardown_test_core`] when it
//! is done.

use tracing::{info, warn};

use crate::contract::{CoreAdminApi, SchemaApi, UnloadOptions, UpdateApi};
use crate::error::Result;
use crate::reconcile::{apply_schema, SyncReport};
use crate::schema_source::{find_configuration, SchemaSource};

/// Makes sure `core` exists and carries the desired schema.
///
/// Returns `Ok(None)` when `source` has no configuration, in which case the
/// schema is left as the config set created it. An invalid or ambiguous
/// configuration is an error.
pub async fn prepare_test_core<A, S>(
    admin: &A,
    schema: &S,
    core: &str,
    config_set: &str,
    source: &dyn SchemaSource,
) -> Result<Option<SyncReport>>
where
    A: CoreAdminApi + ?Sized,
    S: SchemaApi + ?Sized,
{
    let status = admin.status(core).await?;
    if !status.is_loaded(core) {
        info!(core, config_set, "[CORE] Test core missing, creating it");
        admin.create(core, config_set).await?;
    }

    let Some(desired) = find_configuration(source)? else {
        warn!(core, "[CORE] No schema configuration found, leaving test core schema as is");
        return Ok(None);
    };
    let report = apply_schema(&desired, schema).await?;
    info!(core, ?report, "[CORE] Test core ready");
    Ok(Some(report))
}

/// Empties the core and unloads it, removing its instance dir, index and data.
pub async fn teardown_test_core<A, U>(admin: &A, update: &U, core: &str) -> Result<()>
where
    A: CoreAdminApi + ?Sized,
    U: UpdateApi + ?Sized,
{
    info!(core, "[CORE] Tearing down test core");
    update.delete_by_query("*:*").await?;
    admin.unload(core, UnloadOptions::everything()).await
}
