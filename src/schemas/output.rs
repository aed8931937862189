//! `output` blocks

use crate::address::{Address, AddressStep};
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::reference::{RefTypeRule, Reference};
use crate::schema::{AttributeSchema, BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;
use crate::types::ValueType;

use super::{bool_literal, depends_on, string_literal};

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "Output value for consumption by another module or a human interacting via the UI",
    ))
    .with_label(LabelSchema::new("name", Description::plain("Output Name")))
    .with_attribute(
        "description",
        string_literal(Description::plain(
            "Human-readable description of the output (for documentation and UI)",
        )),
    )
    .with_attribute(
        "value",
        AttributeSchema::required(ExprConstraints::new(vec![
            ExprConstraint::traversal(ScopeId::Variable),
            ExprConstraint::traversal(ScopeId::Local),
            ExprConstraint::traversal(ScopeId::Datasource),
            ExprConstraint::traversal(ScopeId::Resource),
            ExprConstraint::traversal(ScopeId::Module),
            ExprConstraint::literal(ValueType::Dynamic),
        ]))
        .with_description(Description::plain(
            "Value, typically a reference to an attribute of a resource or a data source",
        )),
    )
    .with_attribute(
        "sensitive",
        bool_literal(Description::plain(
            "Whether the output contains sensitive material and should be hidden in the UI",
        )),
    )
    .with_attribute(
        "depends_on",
        depends_on(Description::plain(
            "Set of references to hidden dependencies (e.g. resources or data sources)",
        )),
    )
    .with_reference(
        Reference::new(
            ScopeId::Output,
            Address::new(vec![AddressStep::static_value("output"), AddressStep::label(0)]),
        )
        .with_type(RefTypeRule::inferred_from("value")),
    )
}
