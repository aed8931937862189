//! Version Gating Scenarios
//!
//! Builds the built-in Terraform schema at versions around each threshold and
//! checks what configurations the resulting trees accept.

use serde_json::json;

use terraform_schema::{
    diff_trees, schema_for_version, Candidate, ChangeType, ExprConstraint, LanguageVersion,
    SchemaBuilder, SchemaTree, ScopeId, ValueType,
};

fn tree(version: &str) -> SchemaTree {
    schema_for_version(&LanguageVersion::parse(version).unwrap()).unwrap()
}

fn dynamic_set() -> ValueType {
    ValueType::set(ValueType::Dynamic)
}

fn dynamic_map() -> ValueType {
    ValueType::map(ValueType::Dynamic)
}

// =============================================================================
// for_each
// =============================================================================

#[test]
fn test_resource_for_each_absent_before_0_12_6() {
    let resource = tree("0.12.5");
    let resource = resource.block("resource").unwrap();
    assert!(resource.attribute("for_each").is_none());
    assert!(resource.attribute("count").is_some());
}

#[test]
fn test_resource_for_each_from_0_12_6() {
    let t = tree("0.12.6");
    let for_each = t.block("resource").unwrap().attribute("for_each").unwrap();
    assert!(!for_each.is_required());

    let variants: Vec<&ExprConstraint> = for_each.constraints.iter().collect();
    assert!(variants.contains(&&ExprConstraint::literal(dynamic_set())));
    assert!(variants.contains(&&ExprConstraint::literal(dynamic_map())));
    for scope in [ScopeId::Datasource, ScopeId::Resource, ScopeId::Variable, ScopeId::Local] {
        assert!(variants.contains(&&ExprConstraint::typed_traversal(scope, dynamic_set())));
        assert!(variants.contains(&&ExprConstraint::typed_traversal(scope, dynamic_map())));
    }
    assert_eq!(variants.len(), 10);

    assert!(for_each
        .constraints
        .is_satisfied_by(&Candidate::literal(&json!({"a": 1, "b": 2}))));
    assert!(for_each
        .constraints
        .is_satisfied_by(&Candidate::traversal(ScopeId::Variable, ValueType::map(ValueType::String))));
    assert!(!for_each
        .constraints
        .is_satisfied_by(&Candidate::traversal(ScopeId::Module, dynamic_map())));
    assert!(!for_each.constraints.is_satisfied_by(&Candidate::literal(&json!("x"))));
}

#[test]
fn test_data_for_each_follows_resource() {
    assert!(tree("0.12.5").block("data").unwrap().attribute("for_each").is_none());
    assert!(tree("0.12.6").block("data").unwrap().attribute("for_each").is_some());
}

#[test]
fn test_module_repetition_from_0_13() {
    let before = tree("0.12.31");
    let module = before.block("module").unwrap();
    for name in ["count", "for_each", "depends_on"] {
        assert!(module.attribute(name).is_none(), "{} present before 0.13", name);
    }

    let after = tree("0.13.0");
    let module = after.block("module").unwrap();
    for name in ["count", "for_each", "depends_on"] {
        assert!(module.attribute(name).is_some(), "{} missing in 0.13", name);
    }
}

// =============================================================================
// terraform block
// =============================================================================

#[test]
fn test_experiments_from_0_12_18() {
    assert!(tree("0.12.17").block("terraform").unwrap().attribute("experiments").is_none());
    assert!(tree("0.12.18").block("terraform").unwrap().attribute("experiments").is_some());
}

#[test]
fn test_required_providers_before_0_12_20_accepts_only_strings() {
    let t = tree("0.12.19");
    let block = t.block_at(&["terraform", "required_providers"]).unwrap();
    let entry = block.any_attribute().unwrap();

    assert!(entry.constraints.is_satisfied_by(&Candidate::literal(&json!("~> 2.0"))));
    assert!(!entry
        .constraints
        .is_satisfied_by(&Candidate::literal(&json!({"version": "~> 2.0"}))));
    assert_eq!(block.max_items(), Some(1));
}

#[test]
fn test_required_providers_0_12_20_accepts_version_object() {
    let t = tree("0.12.20");
    let entry = t
        .block_at(&["terraform", "required_providers"])
        .unwrap()
        .any_attribute()
        .unwrap();

    assert!(entry
        .constraints
        .is_satisfied_by(&Candidate::literal(&json!({"version": "~> 2.0"}))));
    assert!(!entry
        .constraints
        .is_satisfied_by(&Candidate::literal(&json!({"source": "hashicorp/aws"}))));
}

#[test]
fn test_required_providers_0_13_accepts_source_and_version() {
    let t = tree("0.13.0");
    let block = t.block_at(&["terraform", "required_providers"]).unwrap();
    let entry = block.any_attribute().unwrap();

    let full = Candidate::literal(&json!({"source": "hashicorp/aws", "version": "~> 3.0"}));
    assert!(entry.constraints.matches(&full).is_match());
    assert!(entry.constraints.is_satisfied_by(&Candidate::literal(&json!({"source": "hashicorp/aws"}))));
    assert!(entry.constraints.is_satisfied_by(&Candidate::literal(&json!("~> 3.0"))));
    assert!(!entry
        .constraints
        .is_satisfied_by(&Candidate::literal(&json!({"source": "hashicorp/aws", "region": "x"}))));
    assert_eq!(block.max_items(), None);
}

#[test]
fn test_provider_meta_and_backend_in_0_13() {
    let old = tree("0.12.31");
    assert!(old.block_at(&["terraform", "provider_meta"]).is_none());
    assert_eq!(old.block_at(&["terraform", "backend"]).unwrap().max_items(), Some(1));

    let new = tree("0.13.0");
    let provider_meta = new.block_at(&["terraform", "provider_meta"]).unwrap();
    assert_eq!(provider_meta.dependency_keys().labels, vec![(0, "name".to_string())]);
    assert_eq!(new.block_at(&["terraform", "backend"]).unwrap().max_items(), None);
}

// =============================================================================
// Evolution properties
// =============================================================================

#[test]
fn test_additions_are_monotonic() {
    let builder = SchemaBuilder::terraform();
    let mut versions = vec!["0.12.0".to_string()];
    versions.extend(builder.thresholds().iter().map(|v| v.to_string()));
    versions.push("0.15.4".to_string());

    for pair in versions.windows(2) {
        let changes = diff_trees(&tree(&pair[0]), &tree(&pair[1]));
        assert!(
            !changes
                .iter()
                .any(|c| matches!(c.change_type, ChangeType::AttributeRemoved | ChangeType::BlockRemoved)),
            "{} -> {} removed elements: {:?}",
            pair[0],
            pair[1],
            changes
        );
    }
}

#[test]
fn test_build_is_reproducible() {
    let a = tree("0.13.0");
    let b = tree("0.13.0");
    assert_eq!(a, b);
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    assert_ne!(a.fingerprint().unwrap(), tree("0.12.0").fingerprint().unwrap());
}

#[test]
fn test_future_version_gets_every_delta() {
    assert_eq!(tree("1.5.0"), tree("0.13.0"));
    assert_eq!(tree("0.13.0-rc1"), tree("0.13.0"));
}

#[test]
fn test_old_version_gets_base_schema() {
    assert_eq!(tree("0.11.14"), tree("0.12.0"));
}

#[test]
fn test_variable_validation_from_0_13() {
    assert!(tree("0.12.31").block_at(&["variable", "validation"]).is_none());
    let t = tree("0.13.0");
    let validation = t.block_at(&["variable", "validation"]).unwrap();
    let required: Vec<&str> = validation.required_attributes().collect();
    assert_eq!(required, vec!["condition", "error_message"]);
}
