//! Address templates
//!
//! An [`Address`] describes how to compute, for a concrete block instance,
//! the dotted path other documents use to reference it (`module.vpc`,
//! `var.region`, `local.name`). Resolution never fails hard: documents are
//! analysed while being edited, so a missing label or attribute yields an
//! [`AddressResolution::Unresolved`] outcome instead of an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::ValueType;

// =============================================================================
// Reference Paths
// =============================================================================

/// A dotted reference path, e.g. `data.aws_ami.ubuntu`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RefPath(Vec<String>);

impl RefPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Split a dotted path into segments
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether `self` is `other` or a prefix of it
    pub fn is_prefix_of(&self, other: &RefPath) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<RefPath> for String {
    fn from(path: RefPath) -> Self {
        path.to_string()
    }
}

impl From<String> for RefPath {
    fn from(path: String) -> Self {
        RefPath::parse(&path)
    }
}

// =============================================================================
// Block Instances
// =============================================================================

/// Value of an attribute as found in a parsed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// A literal value known without evaluation
    Literal(serde_json::Value),
    /// A reference expression such as `var.region`
    Reference(RefPath),
    /// A type expression such as `list(string)`
    TypeExpr(ValueType),
    /// Any other expression (function call, template, operator, ...)
    Computed,
}

/// A concrete block from a document, as handed over by the parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockInstance {
    pub block_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl BlockInstance {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_literal(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.with_attribute(name, AttrValue::Literal(value))
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }
}

// =============================================================================
// Address Templates
// =============================================================================

/// One step of an address template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AddressStep {
    /// Fixed segment, e.g. `module`
    Static { value: String },
    /// Value of the block's label at `index`
    LabelValue { index: usize },
    /// Literal value of a named attribute. An `optional` step is skipped when
    /// the attribute is absent.
    AttrValue {
        name: String,
        #[serde(default)]
        optional: bool,
    },
    /// Name of the attribute being addressed (open attribute maps only)
    AttrName,
}

impl AddressStep {
    pub fn static_value(value: impl Into<String>) -> Self {
        AddressStep::Static {
            value: value.into(),
        }
    }

    pub fn label(index: usize) -> Self {
        AddressStep::LabelValue { index }
    }

    pub fn attr_value(name: impl Into<String>) -> Self {
        AddressStep::AttrValue {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional_attr_value(name: impl Into<String>) -> Self {
        AddressStep::AttrValue {
            name: name.into(),
            optional: true,
        }
    }
}

/// Ordered address template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Vec<AddressStep>);

/// Why an address could not be computed for an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The instance has fewer labels than the address reads
    MalformedInstance { required: usize, found: usize },
    /// A label the address reads is empty or contains a `.`
    InvalidLabel { index: usize },
    /// A required attribute is missing from the instance
    AttributeAbsent { name: String },
    /// The attribute exists but is not a statically known scalar
    AttributeNotLiteral { name: String },
    /// An attribute-name step was evaluated without an attribute
    NoAttributeName,
    /// The reference descriptor carries no address template
    NoAddress,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInstance { required, found } => {
                write!(f, "expected at least {} label(s), found {}", required, found)
            }
            Self::InvalidLabel { index } => {
                write!(f, "label {} cannot be used as a path segment", index)
            }
            Self::AttributeAbsent { name } => write!(f, "attribute '{}' is absent", name),
            Self::AttributeNotLiteral { name } => {
                write!(f, "attribute '{}' is not a literal value", name)
            }
            Self::NoAttributeName => write!(f, "no attribute name to address"),
            Self::NoAddress => write!(f, "no address template"),
        }
    }
}

/// Outcome of resolving an address against an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressResolution {
    Resolved(RefPath),
    Unresolved(UnresolvedReason),
}

impl AddressResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, AddressResolution::Resolved(_))
    }

    pub fn path(&self) -> Option<&RefPath> {
        match self {
            AddressResolution::Resolved(path) => Some(path),
            AddressResolution::Unresolved(_) => None,
        }
    }
}

impl Address {
    pub fn new(steps: Vec<AddressStep>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[AddressStep] {
        &self.0
    }

    /// Number of labels an instance needs for this address to resolve
    pub fn required_labels(&self) -> usize {
        self.0
            .iter()
            .filter_map(|step| match step {
                AddressStep::LabelValue { index } => Some(index + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Resolve the address of a block instance
    pub fn resolve(&self, instance: &BlockInstance) -> AddressResolution {
        self.resolve_in(instance, None)
    }

    /// Resolve the address of one attribute of an instance (e.g. a local value)
    pub fn resolve_attribute(&self, instance: &BlockInstance, attribute: &str) -> AddressResolution {
        self.resolve_in(instance, Some(attribute))
    }

    fn resolve_in(&self, instance: &BlockInstance, attribute: Option<&str>) -> AddressResolution {
        let mut segments = Vec::with_capacity(self.0.len());

        for step in &self.0 {
            match step {
                AddressStep::Static { value } => segments.push(value.clone()),

                AddressStep::LabelValue { index } => match instance.labels.get(*index) {
                    Some(label) if is_segment(label) => segments.push(label.clone()),
                    Some(_) => {
                        return AddressResolution::Unresolved(UnresolvedReason::InvalidLabel {
                            index: *index,
                        })
                    }
                    None => {
                        return AddressResolution::Unresolved(UnresolvedReason::MalformedInstance {
                            required: self.required_labels(),
                            found: instance.labels.len(),
                        })
                    }
                },

                AddressStep::AttrValue { name, optional } => match instance.attribute(name) {
                    Some(value) => match literal_segment(value) {
                        Some(segment) => segments.push(segment),
                        None => {
                            return AddressResolution::Unresolved(
                                UnresolvedReason::AttributeNotLiteral { name: name.clone() },
                            )
                        }
                    },
                    None if *optional => {}
                    None => {
                        return AddressResolution::Unresolved(UnresolvedReason::AttributeAbsent {
                            name: name.clone(),
                        })
                    }
                },

                AddressStep::AttrName => match attribute {
                    Some(name) => segments.push(name.to_string()),
                    None => return AddressResolution::Unresolved(UnresolvedReason::NoAttributeName),
                },
            }
        }

        AddressResolution::Resolved(RefPath::new(segments))
    }
}

/// A segment must survive a round trip through the dotted form
fn is_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains('.')
}

fn literal_segment(value: &AttrValue) -> Option<String> {
    match value {
        AttrValue::Literal(serde_json::Value::String(s)) if is_segment(s) => Some(s.clone()),
        AttrValue::Literal(serde_json::Value::Number(n)) => Some(n.to_string()).filter(|s| is_segment(s)),
        AttrValue::Literal(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_address() -> Address {
        Address::new(vec![
            AddressStep::label(0),
            AddressStep::optional_attr_value("alias"),
        ])
    }

    #[test]
    fn test_static_and_label_steps() {
        let address = Address::new(vec![
            AddressStep::static_value("data"),
            AddressStep::label(0),
            AddressStep::label(1),
        ]);
        let instance = BlockInstance::new("data")
            .with_label("aws_ami")
            .with_label("ubuntu");

        let resolved = address.resolve(&instance);
        assert_eq!(resolved.path().unwrap().to_string(), "data.aws_ami.ubuntu");
        assert_eq!(address.resolve(&instance), resolved);
    }

    #[test]
    fn test_missing_label_is_malformed() {
        let address = Address::new(vec![AddressStep::static_value("data"), AddressStep::label(1)]);
        let instance = BlockInstance::new("data").with_label("aws_ami");

        assert_eq!(
            address.resolve(&instance),
            AddressResolution::Unresolved(UnresolvedReason::MalformedInstance {
                required: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_unusable_label_is_unresolved() {
        let address = Address::new(vec![AddressStep::static_value("module"), AddressStep::label(0)]);

        for label in ["", "vpc.main"] {
            let instance = BlockInstance::new("module").with_label(label);
            assert_eq!(
                address.resolve(&instance),
                AddressResolution::Unresolved(UnresolvedReason::InvalidLabel { index: 0 })
            );
        }

        let dotted_alias = BlockInstance::new("provider")
            .with_label("aws")
            .with_literal("alias", json!("eu.west"));
        assert!(!provider_address().resolve(&dotted_alias).is_resolved());
    }

    #[test]
    fn test_optional_attribute_step() {
        let plain = BlockInstance::new("provider").with_label("aws");
        assert_eq!(
            provider_address().resolve(&plain).path().unwrap().to_string(),
            "aws"
        );

        let aliased = plain.clone().with_literal("alias", json!("west"));
        assert_eq!(
            provider_address().resolve(&aliased).path().unwrap().to_string(),
            "aws.west"
        );
    }

    #[test]
    fn test_attribute_step_degrades() {
        let address = Address::new(vec![AddressStep::static_value("x"), AddressStep::attr_value("name")]);

        let absent = BlockInstance::new("x");
        assert_eq!(
            address.resolve(&absent),
            AddressResolution::Unresolved(UnresolvedReason::AttributeAbsent {
                name: "name".to_string()
            })
        );

        let computed = BlockInstance::new("x").with_attribute("name", AttrValue::Computed);
        assert!(matches!(
            address.resolve(&computed),
            AddressResolution::Unresolved(UnresolvedReason::AttributeNotLiteral { .. })
        ));

        let reference = BlockInstance::new("x")
            .with_attribute("name", AttrValue::Reference(RefPath::parse("var.name")));
        assert!(!address.resolve(&reference).is_resolved());
    }

    #[test]
    fn test_attr_name_step() {
        let address = Address::new(vec![AddressStep::static_value("local"), AddressStep::AttrName]);
        let locals = BlockInstance::new("locals").with_literal("region", json!("eu-west-1"));

        assert_eq!(
            address.resolve_attribute(&locals, "region").path().unwrap().to_string(),
            "local.region"
        );
        assert_eq!(
            address.resolve(&locals),
            AddressResolution::Unresolved(UnresolvedReason::NoAttributeName)
        );
    }

    #[test]
    fn test_ref_path_prefix() {
        let module = RefPath::parse("module.vpc");
        assert!(module.is_prefix_of(&RefPath::parse("module.vpc.subnet_ids")));
        assert!(!module.is_prefix_of(&RefPath::parse("module.vpcx")));
        assert!(!module.is_prefix_of(&RefPath::parse("module")));
    }
}
