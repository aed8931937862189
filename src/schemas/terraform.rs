//! The `terraform` settings block

use crate::builder::Delta;
use crate::expr::{ExprConstraint, ExprConstraints, ObjectAttribute};
use crate::schema::{AttributeSchema, BlockSchema, Description, LabelSchema};
use crate::types::ValueType;
use crate::version::{V0_12_18, V0_12_20, V0_13_0};

use super::string_literal;

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Terraform block used to configure some high-level behaviors of Terraform",
    ))
    .with_attribute(
        "required_version",
        string_literal(Description::markdown(
            "Constraint to specify which versions of Terraform can be used \
             with this configuration, e.g. `~> 0.12`",
        )),
    )
    .with_block("backend", backend().with_max_items(1))
    .with_block(
        "required_providers",
        required_providers(
            "What provider version to use within this configuration",
            ExprConstraints::literal(ValueType::String),
            Description::markdown("Version constraint"),
        )
        .with_max_items(1),
    )
}

pub(super) fn deltas() -> Vec<Delta> {
    let string = || ExprConstraints::literal(ValueType::String);

    vec![
        Delta::add_attribute(
            V0_12_18,
            &["terraform"],
            "experiments",
            AttributeSchema::optional(ExprConstraints::one(ExprConstraint::tuple_of(
                ExprConstraints::any(),
            )))
            .with_description(Description::markdown(
                "A tuple of experimental language features to enable",
            )),
        ),
        // object entries with an explicit version
        Delta::replace_block(
            V0_12_20,
            &["terraform"],
            "required_providers",
            required_providers(
                "What provider version to use within this configuration",
                ExprConstraints::new(vec![
                    ExprConstraint::object([("version", ObjectAttribute::optional(string()))]),
                    ExprConstraint::literal(ValueType::String),
                ]),
                Description::markdown("Version constraint"),
            )
            .with_max_items(1),
        ),
        // provider source addresses
        Delta::replace_block(
            V0_13_0,
            &["terraform"],
            "required_providers",
            required_providers(
                "What provider version to use within this configuration \
                 and where to source it from",
                ExprConstraints::new(vec![
                    ExprConstraint::object([
                        ("source", ObjectAttribute::optional(string())),
                        ("version", ObjectAttribute::optional(string())),
                    ]),
                    ExprConstraint::literal(ValueType::String),
                ]),
                Description::markdown("Provider source and version constraint"),
            ),
        ),
        Delta::replace_block(V0_13_0, &["terraform"], "backend", backend()),
        Delta::add_block(
            V0_13_0,
            &["terraform"],
            "provider_meta",
            BlockSchema::new(Description::markdown(
                "Metadata to pass into a provider which supports this",
            ))
            .with_label(LabelSchema::new("name", Description::markdown("Provider Name")).dep_key()),
        ),
    ]
}

fn backend() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Backend configuration which defines exactly where and how \
         operations are performed, where state snapshots are stored, etc.",
    ))
    .with_label(LabelSchema::new("type", Description::markdown("Backend Type")).dep_key())
}

fn required_providers(
    description: &str,
    entry: ExprConstraints,
    entry_description: Description,
) -> BlockSchema {
    BlockSchema::new(Description::markdown(description))
        .with_any_attribute(AttributeSchema::optional(entry).with_description(entry_description))
}
