use mockall::predicate::eq;
use mockall::Sequence;
use serde_json::json;
use solr_sync_core::contract::{
    CoreStatus, MockCoreAdminApi, MockSchemaApi, MockUpdateApi, UnloadOptions,
};
use solr_sync_core::error::SolrError;
use solr_sync_core::schema::{DesiredSchema, FieldDefinition, FieldTypeDefinition};
use solr_sync_core::schema_source::StaticSchemaSource;
use solr_sync_core::test_core::{prepare_test_core, teardown_test_core};

fn status(entry: serde_json::Value) -> CoreStatus {
    serde_json::from_value(json!({ "status": { "test_myproj": entry } })).unwrap()
}

#[tokio::test]
async fn test_missing_core_is_created_and_schema_applied() {
    let mut admin = MockCoreAdminApi::new();
    admin
        .expect_status()
        .with(eq("test_myproj"))
        .returning(|_| Ok(status(json!({}))));
    admin
        .expect_create()
        .with(eq("test_myproj"), eq("basic_configs"))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut schema = MockSchemaApi::new();
    schema
        .expect_list_field_types()
        .returning(|_| Ok(vec![FieldTypeDefinition::new("string", "solr.StrField")]));
    schema.expect_list_fields().returning(|_| Ok(vec![]));
    schema.expect_list_copy_fields().returning(|| Ok(vec![]));
    schema
        .expect_add_field()
        .withf(|f: &FieldDefinition| f.name == "item_type")
        .times(1)
        .returning(|_| Ok(()));

    let source = StaticSchemaSource::single(DesiredSchema {
        fields: vec![FieldDefinition::new("item_type", "string")],
        ..Default::default()
    });
    let report = prepare_test_core(&admin, &schema, "test_myproj", "basic_configs", &source)
        .await
        .expect("prepare should succeed")
        .expect("a schema was configured");
    assert_eq!(report.fields.added, 1);
}

#[tokio::test]
async fn test_existing_core_without_configuration_is_left_alone() {
    let mut admin = MockCoreAdminApi::new();
    admin
        .expect_status()
        .returning(|_| Ok(status(json!({"name": "test_myproj", "uptime": 10}))));
    admin.expect_create().never();

    let mut schema = MockSchemaApi::new();
    schema.expect_list_field_types().never();

    let source = StaticSchemaSource::new(vec![]);
    let report = prepare_test_core(&admin, &schema, "test_myproj", "basic_configs", &source)
        .await
        .expect("prepare should succeed");
    assert!(report.is_none());
}

#[tokio::test]
async fn test_ambiguous_configuration_propagates() {
    let mut admin = MockCoreAdminApi::new();
    admin
        .expect_status()
        .returning(|_| Ok(status(json!({"name": "test_myproj"}))));
    let schema = MockSchemaApi::new();

    let source = StaticSchemaSource::new(vec![DesiredSchema::default(), DesiredSchema::default()]);
    let err = prepare_test_core(&admin, &schema, "test_myproj", "basic_configs", &source)
        .await
        .unwrap_err();
    assert!(matches!(err, SolrError::Configuration(_)));
}

#[tokio::test]
async fn test_teardown_empties_then_unloads() {
    let mut seq = Sequence::new();
    let mut update = MockUpdateApi::new();
    update
        .expect_delete_by_query()
        .with(eq("*:*"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let mut admin = MockCoreAdminApi::new();
    admin
        .expect_unload()
        .with(eq("test_myproj"), eq(UnloadOptions::everything()))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    teardown_test_core(&admin, &update, "test_myproj")
        .await
        .expect("teardown should succeed");
}
