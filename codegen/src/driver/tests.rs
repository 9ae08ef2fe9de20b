#![allow(clippy::expect_used, reason = "test assertions")]

use std::sync::Arc;

use serde_json::{Value, json};

use super::*;
use crate::generator::SupportLevel;

fn index(custom_handlers: Value) -> Arc<TypeIndex> {
    let index = TypeIndex::from_value(json!({
        "classes": [
            { "name": "com.acme.a.Item", "methods": [{ "name": "getName", "return_type": "java.lang.String" }] },
            { "name": "com.acme.b.Item", "methods": [{ "name": "getCode", "return_type": "int" }] },
            {
                "name": "com.acme.Order",
                "methods": [
                    { "name": "getId", "return_type": "long" },
                    { "name": "getPayload", "return_type": "java.lang.Object" },
                ],
            },
            {
                "name": "com.acme.Box",
                "type_parameters": ["T"],
                "methods": [{ "name": "getContent", "return_type": "T" }],
            },
            { "name": "com.acme.Person", "methods": [{ "name": "getName", "return_type": "java.lang.String" }] },
        ],
        "endpoints": [
            { "name": "person", "return_type": "com.acme.Person" },
            { "name": "again", "return_type": "com.acme.Person" },
            { "name": "orders", "return_type": "java.util.List<com.acme.Order>" },
            { "name": "box", "return_type": "com.acme.Box" },
            { "name": "first", "return_type": "com.acme.a.Item" },
            { "name": "second", "return_type": "com.acme.b.Item" },
            { "name": "greeting", "return_type": "java.lang.String" },
        ],
        "custom_handlers": custom_handlers,
    }))
    .expect("index should load");
    Arc::new(index)
}

fn names(types: &[&str]) -> Vec<String> { types.iter().map(ToString::to_string).collect() }

#[test]
fn test_manifest_partitions_roots() {
    let index = index(json!({}));
    let driver = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default());
    let outcome = driver
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");
    let manifest = &outcome.manifest;

    assert!(manifest.enabled);
    assert!(!manifest.contract_handler_present);
    assert_eq!(
        manifest.generated.keys().cloned().collect::<Vec<_>>(),
        names(&[
            "com.acme.Order",
            "com.acme.Person",
            "com.acme.a.Item",
            "com.acme.b.Item"
        ])
    );
    assert_eq!(
        manifest.without_reflection,
        names(&["com.acme.Person", "com.acme.a.Item", "com.acme.b.Item"])
    );
    assert_eq!(manifest.with_reflection, names(&["com.acme.Order"]));
    assert!(manifest.skipped_custom.is_empty());

    let exclusion = manifest
        .not_generated
        .get("com.acme.Box")
        .expect("generic root is excluded");
    assert_eq!(exclusion.failing_type, "com.acme.Box");
    assert!(exclusion.reason.contains("type parameters"));

    let units: Vec<(&str, SupportLevel)> = outcome
        .units
        .iter()
        .map(|unit| (unit.id.as_str(), unit.support))
        .collect();
    assert_eq!(units, vec![
        ("jsonb.serializers.OrderSerializer", SupportLevel::WithUnhandled),
        ("jsonb.serializers.PersonSerializer", SupportLevel::Fully),
        ("jsonb.serializers.com_acme_a_ItemSerializer", SupportLevel::Fully),
        ("jsonb.serializers.com_acme_b_ItemSerializer", SupportLevel::Fully),
    ]);
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential() {
    let index = index(json!({}));
    let source = ReturnTypeCandidates::new(&index);

    let sequential = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&source)
        .expect("sequential run should succeed");
    let concurrent = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run_concurrent(&source)
        .await
        .expect("concurrent run should succeed");

    assert_eq!(sequential, concurrent);
}

#[test]
fn test_disabled_generation_produces_nothing() {
    let index = index(json!({ "contract": true }));
    let config = GlobalSerializationConfig {
        enabled: false,
        ..GlobalSerializationConfig::default()
    };
    let outcome = Driver::new(Arc::clone(&index), config)
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    assert!(outcome.units.is_empty());
    assert!(!outcome.manifest.enabled);
    assert!(!outcome.manifest.contract_handler_present);
    assert!(outcome.manifest.not_generated.is_empty());
}

#[test]
fn test_contract_handler_produces_nothing() {
    let index = index(json!({ "contract": true }));
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    assert!(outcome.units.is_empty());
    assert!(outcome.manifest.enabled);
    assert!(outcome.manifest.contract_handler_present);
    assert!(outcome.manifest.generated.is_empty());
}

#[test]
fn test_custom_type_handler_skips_root() {
    let index = index(json!({ "types": ["com.acme.Person"] }));
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    assert_eq!(outcome.manifest.skipped_custom, names(&["com.acme.Person"]));
    assert!(!outcome.manifest.generated.contains_key("com.acme.Person"));
    assert!(!outcome.manifest.not_generated.contains_key("com.acme.Person"));
    assert_eq!(outcome.units.len(), 3);
}

#[test]
fn test_unit_prefix_is_configurable() {
    let index = index(json!({}));
    let config = GlobalSerializationConfig {
        unit_prefix: "app.json.".to_string(),
        ..GlobalSerializationConfig::default()
    };
    let outcome = Driver::new(Arc::clone(&index), config)
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    assert_eq!(
        outcome
            .manifest
            .generated
            .get("com.acme.Person")
            .map(UnitId::as_str),
        Some("app.json.PersonSerializer")
    );
}

/// Records every call it receives
#[derive(Default)]
struct RecordingSink {
    calls: Vec<String>,
}

impl RegistrationSink for RecordingSink {
    fn register_unit(&mut self, unit: &SerializerUnit) -> Result<()> {
        self.calls.push(format!("unit {}", unit.id));
        Ok(())
    }

    fn register_without_reflection(&mut self, type_name: &str) -> Result<()> {
        self.calls.push(format!("plain {type_name}"));
        Ok(())
    }

    fn finish(&mut self, manifest: &GenerationManifest) -> Result<()> {
        self.calls
            .push(format!("finish {}", manifest.generated.len()));
        Ok(())
    }
}

#[test]
fn test_publish_registers_units_then_finishes() {
    let index = index(json!({ "types": ["com.acme.a.Item", "com.acme.b.Item"] }));
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    let mut sink = RecordingSink::default();
    Driver::publish(&outcome, &mut sink).expect("publish should succeed");
    assert_eq!(sink.calls, vec![
        "unit jsonb.serializers.OrderSerializer",
        "unit jsonb.serializers.PersonSerializer",
        "plain com.acme.Person",
        "finish 2",
    ]);
}

#[test]
fn test_file_system_sink_writes_sources_and_manifest() {
    let index = index(json!({}));
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");

    let dir = tempfile::tempdir().expect("temp dir should be created");
    let out_dir = dir.path().join("generated");
    let mut sink = FileSystemSink::new(&out_dir).expect("sink should create its directory");
    Driver::publish(&outcome, &mut sink).expect("publish should succeed");

    assert_eq!(sink.written().len(), outcome.units.len() + 1);
    let order = std::fs::read_to_string(out_dir.join("jsonb_serializers_orderserializer.rs"))
        .expect("order unit should be written");
    assert!(order.starts_with("// @generated by jsonb-codegen for com.acme.Order"));
    syn::parse_file(&order).expect("generated code should parse");
    assert!(out_dir.join("jsonb_serializers_com_acme_a_itemserializer.rs").exists());

    let manifest: Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join(MANIFEST_FILE_NAME))
            .expect("manifest should be written"),
    )
    .expect("manifest should be valid JSON");
    assert_eq!(
        manifest["generated"]["com.acme.Order"],
        json!("jsonb.serializers.OrderSerializer")
    );
    assert_eq!(manifest["with_reflection"], json!(["com.acme.Order"]));
    assert_eq!(manifest["not_generated"]["com.acme.Box"]["failing_type"], json!("com.acme.Box"));
}

#[test]
fn test_file_names_differing_only_in_case_do_not_overwrite() {
    let index = Arc::new(
        TypeIndex::from_value(json!({
            "classes": [
                { "name": "com.acme.Item", "methods": [{ "name": "getName", "return_type": "java.lang.String" }] },
                { "name": "com.acme.legacy.ITEM", "methods": [{ "name": "getCode", "return_type": "int" }] },
            ],
            "endpoints": [
                { "name": "item", "return_type": "com.acme.Item" },
                { "name": "legacy", "return_type": "com.acme.legacy.ITEM" },
            ],
        }))
        .expect("index should load"),
    );
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");
    assert_eq!(
        outcome
            .manifest
            .generated
            .values()
            .map(UnitId::as_str)
            .collect::<Vec<_>>(),
        vec!["jsonb.serializers.ItemSerializer", "jsonb.serializers.ITEMSerializer2"]
    );

    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut sink = FileSystemSink::new(dir.path()).expect("sink should open its directory");
    Driver::publish(&outcome, &mut sink).expect("publish should succeed");

    let item = std::fs::read_to_string(dir.path().join("jsonb_serializers_itemserializer.rs"))
        .expect("item unit should be written");
    assert!(item.contains("for com.acme.Item\n"));
    let legacy = std::fs::read_to_string(dir.path().join("jsonb_serializers_itemserializer2.rs"))
        .expect("legacy unit should be written");
    assert!(legacy.contains("for com.acme.legacy.ITEM\n"));
}

#[test]
fn test_file_system_sink_refuses_second_write_of_a_file() {
    let index = index(json!({}));
    let outcome = Driver::new(Arc::clone(&index), GlobalSerializationConfig::default())
        .run(&ReturnTypeCandidates::new(&index))
        .expect("run should succeed");
    let unit = outcome.units.first().expect("a unit was generated");

    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut sink = FileSystemSink::new(dir.path()).expect("sink should open its directory");
    sink.register_unit(unit).expect("first write should succeed");

    let error = sink
        .register_unit(unit)
        .expect_err("second write of the same file should fail");
    assert!(matches!(error.current_context(), Error::FileOperation(_)));
    assert_eq!(sink.written().len(), 1);
}
