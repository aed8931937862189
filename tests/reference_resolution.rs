//! Reference Resolution Tests
//!
//! Resolves addresses and types of published symbols against the built-in
//! schema, the way a language server indexes a module's documents.

use serde_json::json;

use terraform_schema::{
    schema_for_version, AddressResolution, AttrValue, BlockInstance, Candidate, LanguageVersion,
    RefPath, ReferenceTargets, SchemaTree, ScopeId, TypeInference, UnresolvedReason, ValueType,
};

fn tree() -> SchemaTree {
    schema_for_version(&LanguageVersion::parse("0.13.0").unwrap()).unwrap()
}

fn reference_of<'a>(tree: &'a SchemaTree, block: &str) -> &'a terraform_schema::Reference {
    tree.block(block).unwrap().reference.as_ref().unwrap()
}

// =============================================================================
// Addresses
// =============================================================================

#[test]
fn test_module_address() {
    let t = tree();
    let module = reference_of(&t, "module");

    let vpc = BlockInstance::new("module")
        .with_label("vpc")
        .with_literal("source", json!("./vpc"));
    assert_eq!(
        module.resolve(&vpc),
        AddressResolution::Resolved(RefPath::parse("module.vpc"))
    );
    assert_eq!(module.scope, ScopeId::Module);

    let unlabeled = BlockInstance::new("module").with_literal("source", json!("./vpc"));
    assert_eq!(
        module.resolve(&unlabeled),
        AddressResolution::Unresolved(UnresolvedReason::MalformedInstance {
            required: 1,
            found: 0
        })
    );
}

#[test]
fn test_provider_address_with_and_without_alias() {
    let t = tree();
    let provider = reference_of(&t, "provider");

    let default = BlockInstance::new("provider").with_label("aws");
    assert_eq!(provider.resolve(&default).path(), Some(&RefPath::parse("aws")));

    let aliased = BlockInstance::new("provider")
        .with_label("aws")
        .with_literal("alias", json!("west"));
    assert_eq!(provider.resolve(&aliased).path(), Some(&RefPath::parse("aws.west")));
}

#[test]
fn test_resource_and_data_addresses() {
    let t = tree();

    let instance = BlockInstance::new("resource")
        .with_label("aws_instance")
        .with_label("web");
    assert_eq!(
        reference_of(&t, "resource").resolve(&instance).path(),
        Some(&RefPath::parse("resource.aws_instance.web"))
    );

    let ami = BlockInstance::new("data").with_label("aws_ami").with_label("ubuntu");
    assert_eq!(
        reference_of(&t, "data").resolve(&ami).path(),
        Some(&RefPath::parse("data.aws_ami.ubuntu"))
    );

    let half = BlockInstance::new("data").with_label("aws_ami");
    assert!(!reference_of(&t, "data").resolve(&half).is_resolved());
}

#[test]
fn test_local_attribute_address() {
    let t = tree();
    let rule = t.block("locals").unwrap().any_attribute().unwrap();
    let reference = rule.reference.as_ref().unwrap();

    let locals = BlockInstance::new("locals").with_literal("service_name", json!("forum"));
    assert_eq!(
        reference.resolve_attribute(&locals, "service_name").path(),
        Some(&RefPath::parse("local.service_name"))
    );
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn test_output_type_inferred_from_value() {
    let t = tree();
    let output = reference_of(&t, "output");
    let targets = ReferenceTargets::new();

    let instance = BlockInstance::new("output")
        .with_label("ids")
        .with_literal("value", json!(["a", "b"]));
    assert_eq!(
        output.infer_type(&instance, None, &targets),
        TypeInference::Inferred(ValueType::Tuple(vec![ValueType::String, ValueType::String]))
    );

    let missing = BlockInstance::new("output").with_label("ids");
    assert_eq!(output.infer_type(&missing, None, &targets), TypeInference::Unresolved);
}

#[test]
fn test_variable_declared_type_wins_over_default() {
    let t = tree();
    let variable = reference_of(&t, "variable");
    let targets = ReferenceTargets::new();

    let declared = BlockInstance::new("variable")
        .with_label("zones")
        .with_attribute("type", AttrValue::TypeExpr(ValueType::list(ValueType::String)))
        .with_literal("default", json!(["a"]));
    assert_eq!(
        variable.infer_type(&declared, None, &targets),
        TypeInference::Inferred(ValueType::list(ValueType::String))
    );

    let mismatched = BlockInstance::new("variable")
        .with_label("port")
        .with_attribute("type", AttrValue::TypeExpr(ValueType::Number))
        .with_literal("default", json!("eighty"));
    assert!(matches!(
        variable.infer_type(&mismatched, None, &targets),
        TypeInference::Mismatched { .. }
    ));

    let inferred = BlockInstance::new("variable")
        .with_label("enabled")
        .with_literal("default", json!(true));
    assert_eq!(
        variable.infer_type(&inferred, None, &targets),
        TypeInference::Inferred(ValueType::Bool)
    );
}

// =============================================================================
// Target tables
// =============================================================================

#[test]
fn test_collect_targets_across_documents() {
    let t = tree();
    let instances = vec![
        BlockInstance::new("output")
            .with_label("region")
            .with_attribute("value", AttrValue::Reference(RefPath::parse("var.region"))),
        BlockInstance::new("variable")
            .with_label("region")
            .with_attribute("type", AttrValue::TypeExpr(ValueType::String)),
        BlockInstance::new("locals")
            .with_literal("count", json!(3))
            .with_attribute("name", AttrValue::Computed),
        BlockInstance::new("provider").with_label("aws"),
        BlockInstance::new("module"),
    ];

    let targets = ReferenceTargets::collect(&t, &instances);

    let output = targets.get(&RefPath::parse("output.region")).unwrap();
    assert_eq!(output.scope, ScopeId::Output);
    assert_eq!(output.ty, ValueType::String);

    assert_eq!(targets.get(&RefPath::parse("local.count")).unwrap().ty, ValueType::Number);
    assert_eq!(targets.get(&RefPath::parse("local.name")).unwrap().ty, ValueType::Dynamic);
    assert_eq!(targets.in_scope(ScopeId::Provider).count(), 1);

    assert_eq!(targets.skipped().len(), 1);
    assert_eq!(targets.skipped()[0].block_type, "module");
}

#[test]
fn test_candidates_match_attribute_constraints() {
    let t = tree();
    let instances = vec![
        BlockInstance::new("provider")
            .with_label("aws")
            .with_literal("alias", json!("west")),
        BlockInstance::new("variable")
            .with_label("replicas")
            .with_attribute("type", AttrValue::TypeExpr(ValueType::Number)),
    ];
    let targets = ReferenceTargets::collect(&t, &instances);
    let data = t.block("data").unwrap();

    let provider = targets.candidate(&AttrValue::Reference(RefPath::parse("aws.west")));
    assert_eq!(provider, Candidate::traversal(ScopeId::Provider, ValueType::Dynamic));
    assert!(data.attribute("provider").unwrap().constraints.is_satisfied_by(&provider));

    let count = data.attribute("count").unwrap();
    let replicas = targets.candidate(&AttrValue::Reference(RefPath::parse("var.replicas")));
    assert!(count.constraints.is_satisfied_by(&replicas));
    assert!(!count
        .constraints
        .is_satisfied_by(&targets.candidate(&AttrValue::Reference(RefPath::parse("var.unknown")))));
}

#[test]
fn test_computed_values_satisfy_collection_attributes() {
    let t = tree();
    let targets = ReferenceTargets::new();
    let computed = targets.candidate(&AttrValue::Computed);

    let module = t.block("module").unwrap();
    assert!(module.attribute("providers").unwrap().constraints.is_satisfied_by(&computed));
    assert!(module.attribute("depends_on").unwrap().constraints.is_satisfied_by(&computed));

    let depends_on = &t.block("resource").unwrap().attribute("depends_on").unwrap().constraints;
    assert!(depends_on.is_satisfied_by(&computed));
    assert!(depends_on.is_satisfied_by(&Candidate::literal(&json!(null))));
    assert!(!depends_on.is_satisfied_by(&Candidate::literal(&json!("aws_instance.web"))));
}
