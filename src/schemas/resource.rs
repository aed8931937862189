//! `resource` blocks and their meta-blocks

use crate::address::{Address, AddressStep};
use crate::builder::Delta;
use crate::expr::{ExprConstraint, ExprConstraints};
use crate::reference::Reference;
use crate::schema::{AttributeSchema, BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;
use crate::types::ValueType;
use crate::version::V0_12_6;

use super::{bool_literal, depends_on, for_each, provider_reference, string_literal};

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "A resource block declares a resource of a given type with a given local name. The name is \
         used to refer to this resource from elsewhere in the same Terraform module, but has no significance \
         outside of the scope of a module.",
    ))
    .with_label(LabelSchema::new("type", Description::plain("Resource Type")).dep_key())
    .with_label(LabelSchema::new("name", Description::plain("Reference Name")))
    .with_attribute(
        "provider",
        provider_reference(Description::markdown(
            "Reference to a `provider` configuration block, e.g. `mycloud.west` or `mycloud`",
        )),
    )
    .with_attribute(
        "count",
        AttributeSchema::optional(ExprConstraints::literal(ValueType::Number)).with_description(
            Description::markdown("Number of instances of this resource, e.g. `3`"),
        ),
    )
    .with_attribute(
        "depends_on",
        depends_on(Description::markdown(
            "Set of references to hidden dependencies, e.g. other resources or data sources",
        )),
    )
    .with_block("lifecycle", lifecycle())
    .with_block("connection", connection())
    .with_block("provisioner", provisioner())
    .with_reference(Reference::new(
        ScopeId::Resource,
        Address::new(vec![
            AddressStep::static_value("resource"),
            AddressStep::label(0),
            AddressStep::label(1),
        ]),
    ))
}

pub(super) fn deltas() -> Vec<Delta> {
    vec![Delta::add_attribute(
        V0_12_6,
        &["resource"],
        "for_each",
        for_each(Description::markdown(
            "A set or a map where each item represents an instance of this resource",
        )),
    )]
}

fn lifecycle() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Lifecycle customizations to change default resource behaviours during apply",
    ))
    .with_attribute(
        "create_before_destroy",
        bool_literal(Description::markdown(
            "Whether to reverse the default order of operations (destroy -> create) during apply \
             when the resource requires replacement (cannot be updated in-place)",
        )),
    )
    .with_attribute(
        "prevent_destroy",
        bool_literal(Description::markdown(
            "Whether to prevent accidental destruction of the resource and cause Terraform \
             to reject with an error any plan that would destroy the resource",
        )),
    )
    .with_attribute(
        "ignore_changes",
        // elements are attribute names of the enclosing resource, not modelled yet
        AttributeSchema::optional(ExprConstraints::one(ExprConstraint::tuple_of(
            ExprConstraints::any(),
        )))
        .with_description(Description::markdown(
            "A tuple of fields (references) of which to ignore changes to, e.g. `tags`",
        )),
    )
}

fn connection() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Connection block describing how the provisioner connects to the given instance",
    ))
    .with_max_items(1)
    .with_attribute(
        "type",
        string_literal(Description::markdown(
            "Connection type to use - `ssh` (default) or `winrm`",
        )),
    )
}

fn provisioner() -> BlockSchema {
    BlockSchema::new(Description::markdown(
        "Provisioner to model specific actions on the local machine or on a remote machine \
         in order to prepare servers or other infrastructure objects for service",
    ))
    .with_label(
        LabelSchema::new(
            "type",
            Description::plain("Type of provisioner to use, e.g. `remote-exec` or `file`"),
        )
        .dep_key(),
    )
    .with_attribute(
        "when",
        AttributeSchema::optional(ExprConstraints::any()).with_description(Description::markdown(
            "When to run the provisioner - `create` or `destroy`, defaults to `create` \
             (i.e. after creation of the resource)",
        )),
    )
    .with_attribute(
        "on_failure",
        AttributeSchema::optional(ExprConstraints::any()).with_description(Description::markdown(
            "What to do when the provisioner run fails to finish - `fail` (default), \
             or `continue` (ignore the error)",
        )),
    )
    .with_block("connection", connection())
}
