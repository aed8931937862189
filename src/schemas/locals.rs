//! `locals` blocks

use crate::address::{Address, AddressStep};
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::reference::{RefTypeRule, Reference};
use crate::schema::{AttributeSchema, BlockSchema, Description};
use crate::scope::ScopeId;
use crate::types::ValueType;

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Local values assigning names to expressions, so you can use these multiple times without repetition\n\
         e.g. `service_name = \"forum\"`",
    ))
    .with_any_attribute(
        AttributeSchema::optional(ExprConstraints::new(vec![
            ExprConstraint::literal(ValueType::Dynamic),
            ExprConstraint::traversal(ScopeId::Local),
        ]))
        .with_reference(
            // each local publishes itself, typed from its own value
            Reference::new(
                ScopeId::Local,
                Address::new(vec![AddressStep::static_value("local"), AddressStep::AttrName]),
            )
            .with_type(RefTypeRule::inferred_self()),
        ),
    )
}
