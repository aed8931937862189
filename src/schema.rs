//! Block and attribute schema tree
//!
//! The structural schema handed to completion, validation and
//! go-to-definition engines. A tree is immutable once built; the only way to
//! obtain a different one is to build another (see [`crate::builder`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::AddressStep;
use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::expr::ExprConstraints;
use crate::reference::Reference;

// =============================================================================
// Descriptions and Labels
// =============================================================================

/// Human-readable documentation attached to a schema element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Description {
    PlainText(String),
    Markdown(String),
}

impl Description {
    pub fn plain(text: impl Into<String>) -> Self {
        Description::PlainText(text.into())
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Description::Markdown(text.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Description::PlainText(s) | Description::Markdown(s) => s,
        }
    }
}

/// One positional label of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSchema {
    pub name: String,
    pub description: Description,
    #[serde(default)]
    pub is_dep_key: bool,
}

impl LabelSchema {
    pub fn new(name: impl Into<String>, description: Description) -> Self {
        Self {
            name: name.into(),
            description,
            is_dep_key: false,
        }
    }

    pub fn dep_key(mut self) -> Self {
        self.is_dep_key = true;
        self
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Whether an attribute must be present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Optional, with the value assumed when absent
    Defaulted(serde_json::Value),
}

/// Schema of a single attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub constraints: ExprConstraints,
    pub presence: Presence,
    #[serde(default)]
    pub is_dep_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
}

impl AttributeSchema {
    pub fn required(constraints: ExprConstraints) -> Self {
        Self::with_presence(constraints, Presence::Required)
    }

    pub fn optional(constraints: ExprConstraints) -> Self {
        Self::with_presence(constraints, Presence::Optional)
    }

    fn with_presence(constraints: ExprConstraints, presence: Presence) -> Self {
        Self {
            constraints,
            presence,
            is_dep_key: false,
            reference: None,
            description: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.presence = Presence::Defaulted(value);
        self
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn dep_key(mut self) -> Self {
        self.is_dep_key = true;
        self
    }

    pub fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }
}

// =============================================================================
// Blocks
// =============================================================================

/// Schema of a block: labels, body and what it publishes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockSchema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelSchema>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
    /// Rule for attributes with arbitrary names; fixed attributes take precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_attribute: Option<Box<AttributeSchema>>,
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
}

/// Labels and attributes that select a dependent body variant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyKeys {
    /// Positions and names of dependency-key labels
    pub labels: Vec<(usize, String)>,
    /// Names of dependency-key attributes
    pub attributes: Vec<String>,
}

impl DependencyKeys {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.attributes.is_empty()
    }

    /// More than one key participates in selecting the body
    pub fn is_composite(&self) -> bool {
        self.labels.len() + self.attributes.len() > 1
    }
}

impl BlockSchema {
    pub fn new(description: Description) -> Self {
        Self {
            description: Some(description),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: LabelSchema) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_any_attribute(mut self, attribute: AttributeSchema) -> Self {
        self.any_attribute = Some(Box::new(attribute));
        self
    }

    pub fn with_block(mut self, name: impl Into<String>, block: BlockSchema) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    pub fn with_max_items(mut self, max: u64) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Fixed attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    pub fn any_attribute(&self) -> Option<&AttributeSchema> {
        self.any_attribute.as_deref()
    }

    /// Schema for an attribute found in a document: the fixed attribute if one
    /// exists, the open rule otherwise
    pub fn attribute_for(&self, name: &str) -> Option<&AttributeSchema> {
        self.attribute(name).or_else(|| self.any_attribute())
    }

    pub fn nested_block(&self, name: &str) -> Option<&BlockSchema> {
        self.blocks.get(name)
    }

    pub fn max_items(&self) -> Option<u64> {
        self.max_items
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.is_required())
            .map(|(name, _)| name.as_str())
    }

    pub fn dependency_keys(&self) -> DependencyKeys {
        DependencyKeys {
            labels: self
                .labels
                .iter()
                .enumerate()
                .filter(|(_, l)| l.is_dep_key)
                .map(|(i, l)| (i, l.name.clone()))
                .collect(),
            attributes: self
                .attributes
                .iter()
                .filter(|(_, a)| a.is_dep_key)
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }

    fn validate(&self, path: &str) -> Result<()> {
        if let Some(reference) = &self.reference {
            self.validate_reference(reference, &format!("{}#reference", path), false)?;
        }

        for (name, attribute) in &self.attributes {
            self.validate_attribute(attribute, &format!("{}.{}", path, name), false)?;
        }

        if let Some(attribute) = self.any_attribute() {
            let attr_path = format!("{}.*", path);
            if attribute.is_dep_key {
                return Err(SchemaError::DependencyKeyOnAnyAttribute { path: attr_path });
            }
            self.validate_attribute(attribute, &attr_path, true)?;
        }

        for (name, block) in &self.blocks {
            block.validate(&format!("{}.{}", path, name))?;
        }

        Ok(())
    }

    fn validate_attribute(&self, attribute: &AttributeSchema, path: &str, open: bool) -> Result<()> {
        let mut empty = false;
        attribute.constraints.walk(&mut |set| empty |= set.is_empty());
        if empty {
            return Err(SchemaError::EmptyConstraints {
                path: path.to_string(),
            });
        }

        if let Some(reference) = &attribute.reference {
            self.validate_reference(reference, path, open)?;
        }

        Ok(())
    }

    fn validate_reference(&self, reference: &Reference, path: &str, open: bool) -> Result<()> {
        if let Some(address) = &reference.address {
            let has_required_step = address.steps().iter().any(|step| {
                !matches!(step, AddressStep::AttrValue { optional: true, .. })
            });
            if !has_required_step {
                return Err(SchemaError::EmptyAddress {
                    path: path.to_string(),
                });
            }

            for step in address.steps() {
                match step {
                    AddressStep::LabelValue { index } if *index >= self.labels.len() => {
                        return Err(SchemaError::LabelIndexOutOfRange {
                            path: path.to_string(),
                            index: *index,
                            declared: self.labels.len(),
                        });
                    }
                    AddressStep::AttrValue { name, .. } if !self.knows_attribute(name) => {
                        return Err(SchemaError::UnknownAddressAttribute {
                            path: path.to_string(),
                            attribute: name.clone(),
                        });
                    }
                    AddressStep::AttrName if !open => {
                        return Err(SchemaError::MisplacedAttrNameStep {
                            path: path.to_string(),
                        });
                    }
                    _ => {}
                }
            }
        }

        for rule in &reference.types {
            if let Some(source) = rule.source_attribute() {
                if !self.knows_attribute(source) {
                    return Err(SchemaError::UnknownTypeSource {
                        path: path.to_string(),
                        attribute: source.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn knows_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name) || self.any_attribute.is_some()
    }
}

// =============================================================================
// Schema Tree
// =============================================================================

/// Root of a schema: the top-level blocks of a configuration document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaTree {
    pub blocks: BTreeMap<String, BlockSchema>,
}

impl SchemaTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, name: impl Into<String>, block: BlockSchema) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Top-level block by type name
    pub fn block(&self, name: &str) -> Option<&BlockSchema> {
        self.blocks.get(name)
    }

    /// Block at a nested path, e.g. `["terraform", "required_providers"]`
    pub fn block_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&BlockSchema> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.blocks.get(first.as_ref())?, |block, name| {
                block.nested_block(name.as_ref())
            })
    }

    /// Block map at a path; the empty path is the root
    pub(crate) fn blocks_at_mut<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Option<&mut BTreeMap<String, BlockSchema>> {
        let mut blocks = &mut self.blocks;
        for name in path {
            blocks = &mut blocks.get_mut(name.as_ref())?.blocks;
        }
        Some(blocks)
    }

    pub(crate) fn block_at_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut BlockSchema> {
        let (last, parent) = path.split_last()?;
        self.blocks_at_mut(parent)?.get_mut(last.as_ref())
    }

    /// Check the tree for authoring defects
    pub fn validate(&self) -> Result<()> {
        for (name, block) in &self.blocks {
            block.validate(name)?;
        }
        Ok(())
    }

    /// Content fingerprint; equal trees have equal fingerprints
    pub fn fingerprint(&self) -> Result<Checksum> {
        Checksum::of_tree(self)
    }
}
