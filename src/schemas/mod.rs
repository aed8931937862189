//! Built-in Terraform configuration schema
//!
//! The 0.12.0 base schema plus the deltas that evolve it through later
//! language versions. Each top-level block lives in its own module and
//! contributes its base definition and its version deltas.

mod data;
mod locals;
mod module;
mod output;
mod provider;
mod resource;
mod terraform;
mod variable;

use crate::builder::{Delta, SchemaBuilder};
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::schema::{AttributeSchema, Description, SchemaTree};
use crate::scope::ScopeId;
use crate::types::ValueType;
use crate::version::V0_12_0;

/// Schema of the earliest supported version
pub fn base_schema() -> SchemaTree {
    SchemaTree::new()
        .with_block("data", data::block())
        .with_block("locals", locals::block())
        .with_block("module", module::block())
        .with_block("output", output::block())
        .with_block("provider", provider::block())
        .with_block("resource", resource::block())
        .with_block("terraform", terraform::block())
        .with_block("variable", variable::block())
}

/// Version deltas over [`base_schema`]
pub fn deltas() -> Vec<Delta> {
    let mut deltas = Vec::new();
    deltas.extend(data::deltas());
    deltas.extend(resource::deltas());
    deltas.extend(module::deltas());
    deltas.extend(terraform::deltas());
    deltas.extend(variable::deltas());
    deltas
}

pub(crate) fn builder() -> SchemaBuilder {
    SchemaBuilder::new(V0_12_0, base_schema(), deltas())
}

// =============================================================================
// Shared attribute shapes
// =============================================================================

/// `depends_on`: a tuple of data source, resource or module references
fn depends_on(description: Description) -> AttributeSchema {
    AttributeSchema::optional(ExprConstraints::one(ExprConstraint::tuple_of(
        ExprConstraints::new(vec![
            ExprConstraint::traversal(ScopeId::Datasource),
            ExprConstraint::traversal(ScopeId::Resource),
            ExprConstraint::traversal(ScopeId::Module),
        ]),
    )))
    .with_description(description)
}

/// Reference to a `provider` configuration
fn provider_reference(description: Description) -> AttributeSchema {
    AttributeSchema::optional(ExprConstraints::one(ExprConstraint::traversal(ScopeId::Provider)))
        .with_description(description)
        .dep_key()
}

/// `count` accepting a number literal or number-typed references
fn count_with_traversals(description: Description) -> AttributeSchema {
    AttributeSchema::optional(ExprConstraints::new(vec![
        ExprConstraint::literal(ValueType::Number),
        ExprConstraint::typed_traversal(ScopeId::Datasource, ValueType::Number),
        ExprConstraint::typed_traversal(ScopeId::Local, ValueType::Number),
        ExprConstraint::typed_traversal(ScopeId::Resource, ValueType::Number),
        ExprConstraint::typed_traversal(ScopeId::Variable, ValueType::Number),
    ]))
    .with_description(description)
}

/// `for_each` accepting a set or map, literal or referenced
fn for_each(description: Description) -> AttributeSchema {
    let set = ValueType::set(ValueType::Dynamic);
    let map = ValueType::map(ValueType::Dynamic);

    let mut variants = vec![
        ExprConstraint::literal(set.clone()),
        ExprConstraint::literal(map.clone()),
    ];
    for scope in [
        ScopeId::Datasource,
        ScopeId::Resource,
        ScopeId::Variable,
        ScopeId::Local,
    ] {
        variants.push(ExprConstraint::typed_traversal(scope, set.clone()));
        variants.push(ExprConstraint::typed_traversal(scope, map.clone()));
    }

    AttributeSchema::optional(ExprConstraints::new(variants)).with_description(description)
}

fn string_literal(description: Description) -> AttributeSchema {
    AttributeSchema::optional(ExprConstraints::literal(ValueType::String)).with_description(description)
}

fn bool_literal(description: Description) -> AttributeSchema {
    AttributeSchema::optional(ExprConstraints::literal(ValueType::Bool)).with_description(description)
}
