//! Reference descriptors and reference targets
//!
//! A [`Reference`] states which scope a block or attribute publishes into,
//! the address template used to name it, and how the type of the published
//! symbol is inferred. [`ReferenceTargets`] applies those descriptors to the
//! block instances of a document, producing the table used for traversal
//! matching and go-to-definition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::{Address, AddressResolution, AttrValue, BlockInstance, RefPath, UnresolvedReason};
use crate::expr::Candidate;
use crate::schema::SchemaTree;
use crate::scope::ScopeId;
use crate::types::ValueType;

// =============================================================================
// Type Inference Rules
// =============================================================================

/// How the type of a published symbol is determined.
///
/// Rules are applied by tier, not by declaration order: an explicit type wins
/// over a sibling type constraint, which wins over the inferred value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RefTypeRule {
    /// Fixed type
    Explicit { ty: ValueType },
    /// Type expression held by a sibling attribute (e.g. a variable's `type`)
    FromConstraint { attribute: String },
    /// Type of a value. `None` means the addressed attribute's own value.
    Inferred {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
}

impl RefTypeRule {
    pub fn from_constraint(attribute: impl Into<String>) -> Self {
        RefTypeRule::FromConstraint {
            attribute: attribute.into(),
        }
    }

    pub fn inferred_from(attribute: impl Into<String>) -> Self {
        RefTypeRule::Inferred {
            attribute: Some(attribute.into()),
        }
    }

    pub fn inferred_self() -> Self {
        RefTypeRule::Inferred { attribute: None }
    }

    fn tier(&self) -> u8 {
        match self {
            RefTypeRule::Explicit { .. } => 1,
            RefTypeRule::FromConstraint { .. } => 2,
            RefTypeRule::Inferred { .. } => 3,
        }
    }

    /// Sibling attribute this rule reads, if any
    pub fn source_attribute(&self) -> Option<&str> {
        match self {
            RefTypeRule::Explicit { .. } => None,
            RefTypeRule::FromConstraint { attribute } => Some(attribute),
            RefTypeRule::Inferred { attribute } => attribute.as_deref(),
        }
    }
}

/// Outcome of inferring the type of a published symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeInference {
    Inferred(ValueType),
    /// The declared type does not accept the value found in the document
    Mismatched {
        declared: ValueType,
        actual: ValueType,
    },
    /// None of the rules could be applied to the instance
    Unresolved,
}

impl TypeInference {
    /// Type to publish for the symbol; unknown and mismatched fall back to
    /// the declared type or dynamic
    pub fn effective_type(&self) -> ValueType {
        match self {
            TypeInference::Inferred(ty) => ty.clone(),
            TypeInference::Mismatched { declared, .. } => declared.clone(),
            TypeInference::Unresolved => ValueType::Dynamic,
        }
    }
}

// =============================================================================
// Reference Descriptor
// =============================================================================

/// What a block or attribute publishes for other documents to reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub scope: ScopeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<RefTypeRule>,
}

impl Reference {
    pub fn new(scope: ScopeId, address: Address) -> Self {
        Self {
            scope,
            address: Some(address),
            types: Vec::new(),
        }
    }

    /// A reference whose address is supplied by an external collaborator
    pub fn unaddressed(scope: ScopeId) -> Self {
        Self {
            scope,
            address: None,
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, rule: RefTypeRule) -> Self {
        self.types.push(rule);
        self
    }

    /// Compute the path of the block instance
    pub fn resolve(&self, instance: &BlockInstance) -> AddressResolution {
        match &self.address {
            Some(address) => address.resolve(instance),
            None => AddressResolution::Unresolved(UnresolvedReason::NoAddress),
        }
    }

    /// Compute the path of one attribute of the instance
    pub fn resolve_attribute(&self, instance: &BlockInstance, attribute: &str) -> AddressResolution {
        match &self.address {
            Some(address) => address.resolve_attribute(instance, attribute),
            None => AddressResolution::Unresolved(UnresolvedReason::NoAddress),
        }
    }

    /// Rules in precedence order
    pub fn rules_by_precedence(&self) -> Vec<&RefTypeRule> {
        let mut rules: Vec<&RefTypeRule> = self.types.iter().collect();
        rules.sort_by_key(|rule| rule.tier());
        rules
    }

    /// Infer the type of the symbol this reference publishes.
    ///
    /// `attribute` names the addressed attribute when the reference belongs to
    /// an open attribute rule; `targets` resolves reference-valued attributes.
    pub fn infer_type(
        &self,
        instance: &BlockInstance,
        attribute: Option<&str>,
        targets: &ReferenceTargets,
    ) -> TypeInference {
        if self.types.is_empty() {
            return TypeInference::Inferred(ValueType::Dynamic);
        }

        let mut declared: Option<ValueType> = None;
        let mut actual: Option<ValueType> = None;

        for rule in self.rules_by_precedence() {
            match rule {
                RefTypeRule::Explicit { ty } if declared.is_none() => declared = Some(ty.clone()),
                RefTypeRule::FromConstraint { attribute } if declared.is_none() => {
                    if let Some(AttrValue::TypeExpr(ty)) = instance.attribute(attribute) {
                        declared = Some(ty.clone());
                    }
                }
                RefTypeRule::Inferred { attribute: source } if actual.is_none() => {
                    let name = source.as_deref().or(attribute);
                    if let Some(value) = name.and_then(|n| instance.attribute(n)) {
                        actual = Some(targets.value_type(value));
                    }
                }
                _ => {}
            }
        }

        match (declared, actual) {
            (Some(declared), Some(actual)) if !actual.is_assignable_to(&declared) => {
                TypeInference::Mismatched { declared, actual }
            }
            (Some(declared), _) => TypeInference::Inferred(declared),
            (None, Some(actual)) => TypeInference::Inferred(actual),
            (None, None) => TypeInference::Unresolved,
        }
    }
}

// =============================================================================
// Reference Targets
// =============================================================================

/// A symbol published by a block instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTarget {
    pub scope: ScopeId,
    pub path: RefPath,
    pub ty: ValueType,
    /// Type of the block that published the target
    pub block_type: String,
}

/// An instance (or instance attribute) whose address could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTarget {
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub reason: UnresolvedReason,
}

/// Table of every symbol published by a set of block instances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTargets {
    targets: BTreeMap<RefPath, ReferenceTarget>,
    skipped: Vec<SkippedTarget>,
}

impl ReferenceTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect targets from document blocks using the schema's reference
    /// descriptors.
    ///
    /// Types that depend on other targets (an output whose value is a
    /// variable, say) are refined by repeating the pass until the table
    /// stops changing. A chain through every published target settles in
    /// one pass per target, so that bounds the repetition.
    pub fn collect(tree: &SchemaTree, instances: &[BlockInstance]) -> Self {
        let mut current = Self::collect_pass(tree, instances, &Self::new());

        for _ in 0..=current.len() {
            let next = Self::collect_pass(tree, instances, &current);
            if next == current {
                break;
            }
            current = next;
        }

        current
    }

    fn collect_pass(tree: &SchemaTree, instances: &[BlockInstance], known: &Self) -> Self {
        let mut table = Self::new();

        for instance in instances {
            let Some(block) = tree.block(&instance.block_type) else {
                continue;
            };

            if let Some(reference) = &block.reference {
                match reference.resolve(instance) {
                    AddressResolution::Resolved(path) => {
                        let ty = reference.infer_type(instance, None, known).effective_type();
                        table.insert(reference.scope, path, ty, &instance.block_type);
                    }
                    AddressResolution::Unresolved(reason) => table.skipped.push(SkippedTarget {
                        block_type: instance.block_type.clone(),
                        attribute: None,
                        reason,
                    }),
                }
            }

            for name in instance.attributes.keys() {
                let Some(reference) = block.attribute_for(name).and_then(|a| a.reference.as_ref()) else {
                    continue;
                };
                match reference.resolve_attribute(instance, name) {
                    AddressResolution::Resolved(path) => {
                        let ty = reference.infer_type(instance, Some(name), known).effective_type();
                        table.insert(reference.scope, path, ty, &instance.block_type);
                    }
                    AddressResolution::Unresolved(reason) => table.skipped.push(SkippedTarget {
                        block_type: instance.block_type.clone(),
                        attribute: Some(name.clone()),
                        reason,
                    }),
                }
            }
        }

        table
    }

    /// Register a target; the first target published under a path wins
    pub fn insert(&mut self, scope: ScopeId, path: RefPath, ty: ValueType, block_type: &str) {
        self.targets.entry(path.clone()).or_insert(ReferenceTarget {
            scope,
            path,
            ty,
            block_type: block_type.to_string(),
        });
    }

    pub fn get(&self, path: &RefPath) -> Option<&ReferenceTarget> {
        self.targets.get(path)
    }

    /// Find the target a traversal walks into: the longest registered path
    /// that is a prefix of the traversal
    pub fn resolve(&self, traversal: &RefPath) -> Option<&ReferenceTarget> {
        self.targets
            .values()
            .filter(|target| target.path.is_prefix_of(traversal))
            .max_by_key(|target| target.path.segments().len())
    }

    /// Candidate shape of a traversal, for constraint matching
    pub fn candidate_for(&self, traversal: &RefPath) -> Candidate {
        match self.resolve(traversal) {
            // attribute access past the target: its type is not modelled here
            Some(target) if target.path == *traversal => Candidate::traversal(target.scope, target.ty.clone()),
            Some(target) => Candidate::traversal(target.scope, ValueType::Dynamic),
            None => Candidate::unresolved_traversal(),
        }
    }

    /// Candidate shape of an attribute value found in a document
    pub fn candidate(&self, value: &AttrValue) -> Candidate {
        match value {
            AttrValue::Literal(literal) => Candidate::literal(literal),
            AttrValue::Reference(path) => self.candidate_for(path),
            AttrValue::TypeExpr(ty) => Candidate::TypeExpr(ty.clone()),
            AttrValue::Computed => Candidate::Literal(ValueType::Dynamic),
        }
    }

    fn value_type(&self, value: &AttrValue) -> ValueType {
        match value {
            AttrValue::Literal(literal) => ValueType::of_value(literal),
            AttrValue::Reference(path) => match self.candidate_for(path) {
                Candidate::Traversal { ty, .. } => ty,
                _ => ValueType::Dynamic,
            },
            AttrValue::TypeExpr(_) | AttrValue::Computed => ValueType::Dynamic,
        }
    }

    /// Targets published into a scope, in path order
    pub fn in_scope(&self, scope: ScopeId) -> impl Iterator<Item = &ReferenceTarget> {
        self.targets.values().filter(move |t| t.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceTarget> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Instances whose address could not be computed
    pub fn skipped(&self) -> &[SkippedTarget] {
        &self.skipped
    }
}
