//! `provider` blocks

use crate::address::{Address, AddressStep};
use crate::reference::Reference;
use crate::schema::{BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;

use super::string_literal;

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "A provider block is used to specify a provider configuration",
    ))
    .with_label(LabelSchema::new("name", Description::plain("Provider Name")).dep_key())
    .with_attribute(
        "alias",
        string_literal(Description::markdown(
            "Alias for using the same provider with different configurations for different resources, e.g. `eu-west`",
        )),
    )
    .with_attribute(
        "version",
        string_literal(Description::markdown(
            "Specifies a version constraint for the provider, e.g. `~> 1.0`",
        )),
    )
    // `aws` or `aws.west`
    .with_reference(Reference::new(
        ScopeId::Provider,
        Address::new(vec![AddressStep::label(0), AddressStep::optional_attr_value("alias")]),
    ))
}
