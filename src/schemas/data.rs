//! `data` blocks

use crate::address::{Address, AddressStep};
use crate::builder::Delta;
use crate::reference::Reference;
use crate::schema::{BlockSchema, Description, LabelSchema};
use crate::scope::ScopeId;
use crate::version::V0_12_6;

use super::{count_with_traversals, depends_on, for_each, provider_reference};

pub(super) fn block() -> BlockSchema {
    BlockSchema::new(Description::plain(
        "A data block requests that Terraform read from a given data source and export the result \
         under the given local name. The name is used to refer to this resource from elsewhere in the same \
         Terraform module, but has no significance outside of the scope of a module.",
    ))
    .with_label(LabelSchema::new("type", Description::plain("Data Source Type")).dep_key())
    .with_label(LabelSchema::new("name", Description::plain("Reference Name")))
    .with_attribute(
        "provider",
        provider_reference(Description::markdown(
            "Reference to a `provider` configuration block, e.g. `mycloud.west` or `mycloud`",
        )),
    )
    .with_attribute(
        "count",
        count_with_traversals(Description::markdown(
            "Number of instances of this data source, e.g. `3`",
        )),
    )
    .with_attribute(
        "depends_on",
        depends_on(Description::markdown(
            "Set of references to hidden dependencies, e.g. other resources or data sources",
        )),
    )
    .with_reference(Reference::new(
        ScopeId::Datasource,
        Address::new(vec![
            AddressStep::static_value("data"),
            AddressStep::label(0),
            AddressStep::label(1),
        ]),
    ))
}

pub(super) fn deltas() -> Vec<Delta> {
    vec![Delta::add_attribute(
        V0_12_6,
        &["data"],
        "for_each",
        for_each(Description::markdown(
            "A set or a map where each item represents an instance of this data source",
        )),
    )]
}
