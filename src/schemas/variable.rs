//! `variable` blocks

use crate::address::{Address, AddressStep};
use crate::builder::Delta;
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::reference::{RefTypeRule, Reference};
use crate::schema::{AttributeSchema, BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;
use crate::types::ValueType;
use crate::version::V0_13_0;

use super::string_literal;

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "Input variable allowing users to customize aspects of the configuration when used directly \
         (e.g. via CLI, tfvars file or via environment variables), or as a module (via module arguments)",
    ))
    .with_label(LabelSchema::new("name", Description::plain("Variable Name")))
    .with_attribute(
        "description",
        string_literal(Description::plain(
            "Description to document the purpose of the variable and what value is expected",
        )),
    )
    .with_attribute(
        "type",
        AttributeSchema::optional(ExprConstraints::one(ExprConstraint::TypeDeclaration))
            .with_description(Description::plain(
                "Type constraint restricting the type of value to accept, e.g. string or list(string)",
            )),
    )
    .with_attribute(
        "default",
        AttributeSchema::optional(ExprConstraints::literal(ValueType::Dynamic)).with_description(
            Description::plain("Default value to use when variable is not explicitly set"),
        ),
    )
    // the declared type wins over the type of the default
    .with_reference(
        Reference::new(
            ScopeId::Variable,
            Address::new(vec![AddressStep::static_value("var"), AddressStep::label(0)]),
        )
        .with_type(RefTypeRule::from_constraint("type"))
        .with_type(RefTypeRule::inferred_from("default")),
    )
}

/// Custom validation rules became generally available in 0.13
pub(super) fn deltas() -> Vec<Delta> {
    vec![Delta::add_block(
        V0_13_0,
        &["variable"],
        "validation",
        BlockSchema::new(Description::plain(
            "Custom validation rule to restrict what value is expected for the variable",
        ))
        .with_attribute(
            "condition",
            AttributeSchema::required(ExprConstraints::new(vec![
                ExprConstraint::literal(ValueType::Bool),
                ExprConstraint::typed_traversal(ScopeId::Variable, ValueType::Bool),
            ]))
            .with_description(Description::plain(
                "Condition under which a variable value is valid, \
                 e.g. length(var.example) >= 4 enforces minimum of 4 characters",
            )),
        )
        .with_attribute(
            "error_message",
            AttributeSchema::required(ExprConstraints::literal(ValueType::String)).with_description(
                Description::plain(
                    "Error message to present when the variable is considered invalid, \
                     i.e. when condition evaluates to false",
                ),
            ),
        ),
    )]
}
