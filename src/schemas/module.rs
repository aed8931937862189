//! `module` blocks

use crate::address::{Address, AddressStep};
use crate::builder::Delta;
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::reference::Reference;
use crate::schema::{AttributeSchema, BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;
use crate::types::ValueType;
use crate::version::V0_13_0;

use super::{count_with_traversals, depends_on, for_each, string_literal};

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "Module block to call a locally or remotely stored module",
    ))
    .with_label(LabelSchema::new("name", Description::plain("Reference Name")))
    .with_attribute(
        "source",
        AttributeSchema::required(ExprConstraints::literal(ValueType::String))
            .with_description(Description::markdown(
                "Source where to load the module from, \
                 a local directory (e.g. `./module`) or a remote address - e.g. \
                 `hashicorp/consul/aws` (Terraform Registry address) or \
                 `github.com/hashicorp/example` (GitHub)",
            ))
            .dep_key(),
    )
    .with_attribute(
        "version",
        string_literal(Description::markdown(
            "Constraint to set the version of the module, e.g. `~> 1.0`. \
             Only applicable to modules in a module registry.",
        )),
    )
    .with_attribute(
        "providers",
        AttributeSchema::optional(ExprConstraints::one(ExprConstraint::map_of(
            ExprConstraints::literal(ValueType::String),
            ExprConstraints::one(ExprConstraint::traversal(ScopeId::Provider)),
        )))
        .with_description(Description::markdown(
            "Explicit mapping of providers which the module uses",
        )),
    )
    .with_reference(Reference::new(
        ScopeId::Module,
        Address::new(vec![AddressStep::static_value("module"), AddressStep::label(0)]),
    ))
}

/// Module repetition and explicit dependencies arrived in 0.13
pub(super) fn deltas() -> Vec<Delta> {
    vec![
        Delta::add_attribute(
            V0_13_0,
            &["module"],
            "count",
            count_with_traversals(Description::markdown(
                "Number of instances of this module, e.g. `3`",
            )),
        ),
        Delta::add_attribute(
            V0_13_0,
            &["module"],
            "for_each",
            for_each(Description::markdown(
                "A set or a map where each item represents an instance of this module",
            )),
        ),
        Delta::add_attribute(
            V0_13_0,
            &["module"],
            "depends_on",
            depends_on(Description::markdown(
                "Set of references to hidden dependencies, e.g. other resources or data sources",
            )),
        ),
    ]
}
