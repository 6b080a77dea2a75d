//! Schema reconciliation: bring a live core's schema in line with a
//! [`DesiredSchema`] using the fewest schema API calls.
//!
//! Each phase fetches the live listing for its category, diffs it against the
//! desired declarations and applies the result. Phases run strictly in order,
//! because later ones reference what earlier ones created:
//!
//!   1. field types
//!   2. fields (reference field types)
//!   3. copy fields (reference fields)
//!
//! Within a phase, deletes go first (freeing names), then adds, then replaces.
//! Replaces always resubmit the complete definition.
//!
//! # Ownership
//! Only live objects in the category's [`ManagedSet`] (declared now, or listed
//! under `retired`) are ever deleted. Engine built-ins and anything another
//! tool created are left untouched no matter what the desired schema says.
//!
//! # Failure
//! The first failing call aborts the run with [`SolrError::Apply`] naming the
//! phase, operation and object. Nothing is rolled back; running again diffs
//! against the new live state and applies only what is left.
//!
//! Reloading the core afterwards is the caller's job (see
//! [`crate::contract::CoreAdminApi::reload`]).

use std::collections::{HashMap, HashSet};

use tracing::{error, info};

use crate::contract::SchemaApi;
use crate::error::{Phase, Result, SolrError};
use crate::schema::{
    CopyFieldDefinition, CopyFieldKey, DesiredSchema, FieldDefinition, FieldTypeDefinition,
    ManagedSet, SchemaCommand,
};
use crate::schema_source::{resolve_configuration, SchemaSource};

/// Counts of applied operations for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: usize,
    pub replaced: usize,
    pub deleted: usize,
}

impl ChangeSet {
    pub fn total(&self) -> usize {
        self.added + self.replaced + self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Human-readable lines such as `Added 2 field types`; zero counts are
    /// left out.
    pub fn summary(&self, label: &str) -> Vec<String> {
        [
            ("Added", self.added),
            ("Replaced", self.replaced),
            ("Deleted", self.deleted),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(action, count)| {
            let plural = if count == 1 { "" } else { "s" };
            format!("{action} {count} {label}{plural}")
        })
        .collect()
    }
}

/// Outcome of a full synchronisation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub field_types: ChangeSet,
    pub fields: ChangeSet,
    pub copy_fields: ChangeSet,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.field_types.is_empty() && self.fields.is_empty() && self.copy_fields.is_empty()
    }

    /// Report lines for field types and fields, in that order.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = self.field_types.summary("field type");
        lines.extend(self.fields.summary("field"));
        lines
    }
}

/// A named schema object reconciled by name: field types and fields.
pub trait SchemaObject: Clone + PartialEq {
    const PHASE: Phase;

    fn name(&self) -> &str;

    /// Equality against a live listing entry.
    fn same_definition(&self, live: &Self) -> bool;

    fn add_command(&self) -> SchemaCommand<'_>;

    fn replace_command(&self) -> SchemaCommand<'_>;

    fn delete_command(name: &str) -> SchemaCommand<'_>;
}

impl SchemaObject for FieldTypeDefinition {
    const PHASE: Phase = Phase::FieldTypes;

    fn name(&self) -> &str {
        &self.name
    }

    fn same_definition(&self, live: &Self) -> bool {
        FieldTypeDefinition::same_definition(self, live)
    }

    fn add_command(&self) -> SchemaCommand<'_> {
        SchemaCommand::AddFieldType(self)
    }

    fn replace_command(&self) -> SchemaCommand<'_> {
        SchemaCommand::ReplaceFieldType(self)
    }

    fn delete_command(name: &str) -> SchemaCommand<'_> {
        SchemaCommand::DeleteFieldType(name)
    }
}

impl SchemaObject for FieldDefinition {
    const PHASE: Phase = Phase::Fields;

    fn name(&self) -> &str {
        &self.name
    }

    fn same_definition(&self, live: &Self) -> bool {
        FieldDefinition::same_definition(self, live)
    }

    fn add_command(&self) -> SchemaCommand<'_> {
        SchemaCommand::AddField(self)
    }

    fn replace_command(&self) -> SchemaCommand<'_> {
        SchemaCommand::ReplaceField(self)
    }

    fn delete_command(name: &str) -> SchemaCommand<'_> {
        SchemaCommand::DeleteField(name)
    }
}

/// Operations one phase will apply, each bucket in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPlan<T> {
    pub delete: Vec<String>,
    pub add: Vec<T>,
    pub replace: Vec<T>,
}

impl<T: SchemaObject> SchemaPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.add.is_empty() && self.replace.is_empty()
    }

    pub fn change_set(&self) -> ChangeSet {
        ChangeSet {
            added: self.add.len(),
            replaced: self.replace.len(),
            deleted: self.delete.len(),
        }
    }

    /// Deletes, then adds, then replaces.
    pub fn commands(&self) -> Vec<SchemaCommand<'_>> {
        self.delete
            .iter()
            .map(|name| T::delete_command(name))
            .chain(self.add.iter().map(T::add_command))
            .chain(self.replace.iter().map(T::replace_command))
            .collect()
    }
}

/// Diffs desired against live by name.
///
/// Desired objects missing live are added, those whose live definition differs
/// are replaced, identical ones are skipped. Live objects absent from desired
/// are deleted only when `managed` owns them.
pub fn diff_named<T: SchemaObject>(
    desired: &[T],
    live: &[T],
    managed: &ManagedSet<String>,
) -> SchemaPlan<T> {
    let live_by_name: HashMap<&str, &T> = live.iter().map(|obj| (obj.name(), obj)).collect();
    let desired_names: HashSet<&str> = desired.iter().map(SchemaObject::name).collect();

    let mut seen = HashSet::new();
    let delete = live
        .iter()
        .map(SchemaObject::name)
        .filter(|name| !desired_names.contains(name) && managed.contains(*name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect();

    let mut add = Vec::new();
    let mut replace = Vec::new();
    for obj in desired {
        match live_by_name.get(obj.name()) {
            None => add.push(obj.clone()),
            Some(current) if !obj.same_definition(current) => replace.push(obj.clone()),
            Some(_) => {}
        }
    }

    SchemaPlan {
        delete,
        add,
        replace,
    }
}

pub fn diff_field_types(
    desired: &[FieldTypeDefinition],
    live: &[FieldTypeDefinition],
    managed: &ManagedSet<String>,
) -> SchemaPlan<FieldTypeDefinition> {
    diff_named(desired, live, managed)
}

pub fn diff_fields(
    desired: &[FieldDefinition],
    live: &[FieldDefinition],
    managed: &ManagedSet<String>,
) -> SchemaPlan<FieldDefinition> {
    diff_named(desired, live, managed)
}

/// Copy-field operations; there is no replace, a changed rule is deleted and
/// added again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyFieldPlan {
    pub delete: Vec<CopyFieldDefinition>,
    pub add: Vec<CopyFieldDefinition>,
}

impl CopyFieldPlan {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.add.is_empty()
    }

    pub fn change_set(&self) -> ChangeSet {
        ChangeSet {
            added: self.add.len(),
            replaced: 0,
            deleted: self.delete.len(),
        }
    }

    pub fn commands(&self) -> Vec<SchemaCommand<'_>> {
        self.delete
            .iter()
            .map(|cf| SchemaCommand::DeleteCopyField {
                source: &cf.source,
                dest: &cf.dest,
            })
            .chain(self.add.iter().map(SchemaCommand::AddCopyField))
            .collect()
    }
}

pub fn diff_copy_fields(
    desired: &[CopyFieldDefinition],
    live: &[CopyFieldDefinition],
    managed: &ManagedSet<CopyFieldKey>,
) -> CopyFieldPlan {
    let desired_set: HashSet<&CopyFieldDefinition> = desired.iter().collect();
    let live_set: HashSet<&CopyFieldDefinition> = live.iter().collect();

    let mut seen = HashSet::new();
    let delete = live
        .iter()
        .filter(|cf| !desired_set.contains(cf) && managed.contains(&cf.key()))
        .filter(|cf| seen.insert(cf.key()))
        .cloned()
        .collect();
    let add = desired
        .iter()
        .filter(|cf| !live_set.contains(cf))
        .cloned()
        .collect();

    CopyFieldPlan { delete, add }
}

async fn send<C: SchemaApi + ?Sized>(client: &C, command: SchemaCommand<'_>) -> Result<()> {
    match command {
        SchemaCommand::AddFieldType(ft) => client.add_field_type(ft).await,
        SchemaCommand::ReplaceFieldType(ft) => client.replace_field_type(ft).await,
        SchemaCommand::DeleteFieldType(name) => client.delete_field_type(name).await,
        SchemaCommand::AddField(f) => client.add_field(f).await,
        SchemaCommand::ReplaceField(f) => client.replace_field(f).await,
        SchemaCommand::DeleteField(name) => client.delete_field(name).await,
        SchemaCommand::AddCopyField(cf) => client.add_copy_field(cf).await,
        SchemaCommand::DeleteCopyField { source, dest } => {
            client.delete_copy_field(source, dest).await
        }
    }
}

/// Sends commands one at a time, stopping at the first failure.
async fn apply_commands<C: SchemaApi + ?Sized>(
    client: &C,
    phase: Phase,
    commands: Vec<SchemaCommand<'_>>,
) -> Result<()> {
    for command in commands {
        let operation = command.operation();
        let name = command.target();
        info!(%phase, operation, name = %name, "[SCHEMA] Applying schema change");
        if let Err(e) = send(client, command).await {
            error!(
                %phase,
                operation,
                name = %name,
                error = %e,
                "[SCHEMA][ERROR] Schema change failed"
            );
            return Err(SolrError::Apply {
                phase,
                operation,
                name,
                source: Box::new(e),
            });
        }
    }
    Ok(())
}

/// Applies a name-keyed plan and returns what it did.
pub async fn apply_plan<C, T>(client: &C, plan: &SchemaPlan<T>) -> Result<ChangeSet>
where
    C: SchemaApi + ?Sized,
    T: SchemaObject,
{
    let phase = T::PHASE;
    apply_commands(client, phase, plan.commands()).await?;
    let changes = plan.change_set();
    info!(%phase, ?changes, "[SCHEMA] Phase complete");
    Ok(changes)
}

pub async fn apply_copy_field_plan<C: SchemaApi + ?Sized>(
    client: &C,
    plan: &CopyFieldPlan,
) -> Result<ChangeSet> {
    let phase = Phase::CopyFields;
    apply_commands(client, phase, plan.commands()).await?;
    let changes = plan.change_set();
    info!(%phase, ?changes, "[SCHEMA] Phase complete");
    Ok(changes)
}

/// Fetches live field types and plans the field-type phase.
///
/// Fails with [`SolrError::Usage`] when a desired field would reference a type
/// that does not exist once the plan has run.
pub async fn plan_field_types<C: SchemaApi + ?Sized>(
    client: &C,
    desired: &DesiredSchema,
) -> Result<SchemaPlan<FieldTypeDefinition>> {
    let live = client.list_field_types(false).await?;
    let plan = diff_field_types(
        &desired.field_types,
        &live,
        &desired.managed_field_types(),
    );
    check_field_type_references(desired, &live, &plan)?;
    Ok(plan)
}

pub async fn reconcile_field_types<C: SchemaApi + ?Sized>(
    client: &C,
    desired: &DesiredSchema,
) -> Result<ChangeSet> {
    let plan = plan_field_types(client, desired).await?;
    apply_plan(client, &plan).await
}

pub async fn reconcile_fields<C: SchemaApi + ?Sized>(
    client: &C,
    desired: &DesiredSchema,
) -> Result<ChangeSet> {
    let live = client.list_fields(false).await?;
    let plan = diff_fields(&desired.fields, &live, &desired.managed_fields());
    apply_plan(client, &plan).await
}

pub async fn reconcile_copy_fields<C: SchemaApi + ?Sized>(
    client: &C,
    desired: &DesiredSchema,
) -> Result<ChangeSet> {
    let live = client.list_copy_fields().await?;
    let plan = diff_copy_fields(
        &desired.copy_fields,
        &live,
        &desired.managed_copy_fields(),
    );
    apply_copy_field_plan(client, &plan).await
}

/// Every desired field must name a type that will exist once the field-type
/// phase has run.
fn check_field_type_references(
    desired: &DesiredSchema,
    live_types: &[FieldTypeDefinition],
    plan: &SchemaPlan<FieldTypeDefinition>,
) -> Result<()> {
    let deleted: HashSet<&str> = plan.delete.iter().map(String::as_str).collect();
    let available: HashSet<&str> = live_types
        .iter()
        .map(|ft| ft.name.as_str())
        .filter(|name| !deleted.contains(name))
        .chain(desired.field_types.iter().map(|ft| ft.name.as_str()))
        .collect();

    for field in &desired.fields {
        if !available.contains(field.field_type.as_str()) {
            error!(
                field = %field.name,
                field_type = %field.field_type,
                "[SCHEMA][ERROR] Unknown field type"
            );
            return Err(SolrError::Usage(format!(
                "field '{}' references unknown field type '{}'",
                field.name, field.field_type
            )));
        }
    }
    Ok(())
}

/// Runs all three phases for an already resolved configuration.
pub async fn apply_schema<C: SchemaApi + ?Sized>(
    desired: &DesiredSchema,
    client: &C,
) -> Result<SyncReport> {
    desired.validate()?;
    info!(
        field_types = desired.field_types.len(),
        fields = desired.fields.len(),
        copy_fields = desired.copy_fields.len(),
        "[SCHEMA] Starting schema synchronisation"
    );

    let field_types = reconcile_field_types(client, desired).await?;
    let fields = reconcile_fields(client, desired).await?;
    let copy_fields = reconcile_copy_fields(client, desired).await?;

    let report = SyncReport {
        field_types,
        fields,
        copy_fields,
    };
    info!(?report, "[SCHEMA] Schema synchronisation complete");
    Ok(report)
}

/// Resolves exactly one desired schema from `source` and applies it.
///
/// Configuration problems surface before any request is sent.
pub async fn synchronize<C: SchemaApi + ?Sized>(
    source: &dyn SchemaSource,
    client: &C,
) -> Result<SyncReport> {
    let desired = resolve_configuration(source)?;
    apply_schema(&desired, client).await
}
