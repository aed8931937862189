//! Expression Constraint Algebra
//!
//! Describes which value shapes an attribute accepts. A constraint set is an
//! ordered "one of": a candidate satisfies the set when any member variant
//! accepts it. Order only matters for completion ranking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scope::ScopeId;
use crate::types::ValueType;

// =============================================================================
// Constraint Variants
// =============================================================================

/// A single acceptable expression shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprConstraint {
    /// Literal value of a type; `Dynamic` accepts any literal
    Literal { ty: ValueType },
    /// Reference into a scope, optionally restricted to a value type
    ScopeTraversal {
        scope: ScopeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        of_type: Option<ValueType>,
    },
    /// Tuple / list expression
    Tuple { elements: TupleElements },
    /// Map expression with constrained keys and values
    Map {
        key: ExprConstraints,
        value: ExprConstraints,
    },
    /// Object expression with a fixed set of attributes
    Object {
        attributes: BTreeMap<String, ObjectAttribute>,
        #[serde(default)]
        open: bool,
    },
    /// Type expression, e.g. `list(string)`
    TypeDeclaration,
    /// Placeholder accepting any expression
    Any,
}

/// Element constraints of a tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleElements {
    /// Fixed arity, one constraint set per position
    Positional(Vec<ExprConstraints>),
    /// Any arity, every element matches the same constraint set
    Uniform(ExprConstraints),
}

/// One attribute of an object constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectAttribute {
    pub constraints: ExprConstraints,
    #[serde(default)]
    pub optional: bool,
}

impl ObjectAttribute {
    pub fn required(constraints: ExprConstraints) -> Self {
        Self {
            constraints,
            optional: false,
        }
    }

    pub fn optional(constraints: ExprConstraints) -> Self {
        Self {
            constraints,
            optional: true,
        }
    }
}

impl ExprConstraint {
    pub fn literal(ty: ValueType) -> Self {
        ExprConstraint::Literal { ty }
    }

    pub fn traversal(scope: ScopeId) -> Self {
        ExprConstraint::ScopeTraversal {
            scope,
            of_type: None,
        }
    }

    pub fn typed_traversal(scope: ScopeId, ty: ValueType) -> Self {
        ExprConstraint::ScopeTraversal {
            scope,
            of_type: Some(ty),
        }
    }

    /// Tuple whose elements each satisfy `element`
    pub fn tuple_of(element: ExprConstraints) -> Self {
        ExprConstraint::Tuple {
            elements: TupleElements::Uniform(element),
        }
    }

    /// Tuple with one constraint set per position
    pub fn tuple(positions: Vec<ExprConstraints>) -> Self {
        ExprConstraint::Tuple {
            elements: TupleElements::Positional(positions),
        }
    }

    pub fn map_of(key: ExprConstraints, value: ExprConstraints) -> Self {
        ExprConstraint::Map { key, value }
    }

    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, ObjectAttribute)>,
        K: Into<String>,
    {
        ExprConstraint::Object {
            attributes: attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            open: false,
        }
    }

    /// Check whether this variant accepts the candidate
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        match self {
            ExprConstraint::Any => true,

            ExprConstraint::Literal { ty } => candidate
                .literal_type()
                .is_some_and(|actual| actual.is_assignable_to(ty)),

            ExprConstraint::ScopeTraversal { scope, of_type } => match candidate {
                Candidate::Traversal {
                    scope: Some(target),
                    ty,
                } => {
                    target == scope
                        && of_type
                            .as_ref()
                            .map_or(true, |expected| ty.is_assignable_to(expected))
                }
                _ => false,
            },

            ExprConstraint::TypeDeclaration => matches!(candidate, Candidate::TypeExpr(_)),

            // computed and null values are only known at plan time
            ExprConstraint::Tuple { .. } | ExprConstraint::Map { .. } | ExprConstraint::Object { .. }
                if candidate.is_dynamic_literal() =>
            {
                true
            }

            ExprConstraint::Tuple { elements } => accepts_tuple(elements, candidate),

            ExprConstraint::Map { key, value } => accepts_map(key, value, candidate),

            ExprConstraint::Object { attributes, open } => match candidate.as_attributes() {
                Some(present) => {
                    let required_present = attributes
                        .iter()
                        .filter(|(_, attr)| !attr.optional)
                        .all(|(name, _)| present.contains_key(name));

                    required_present
                        && present.iter().all(|(name, value)| match attributes.get(name) {
                            Some(attr) => attr.constraints.is_satisfied_by(value),
                            None => *open,
                        })
                }
                None => false,
            },
        }
    }
}

fn accepts_tuple(elements: &TupleElements, candidate: &Candidate) -> bool {
    // list/set literals have no fixed arity, so only a uniform rule can judge them
    if let Candidate::Literal(ValueType::List(element) | ValueType::Set(element)) = candidate {
        return match elements {
            TupleElements::Uniform(rule) => {
                rule.is_satisfied_by(&Candidate::Literal(element.as_ref().clone()))
            }
            TupleElements::Positional(_) => false,
        };
    }

    let Some(items) = candidate.as_items() else {
        return false;
    };

    match elements {
        TupleElements::Uniform(rule) => items.iter().all(|item| rule.is_satisfied_by(item)),
        TupleElements::Positional(rules) => {
            rules.len() == items.len()
                && rules
                    .iter()
                    .zip(&items)
                    .all(|(rule, item)| rule.is_satisfied_by(item))
        }
    }
}

fn accepts_map(key: &ExprConstraints, value: &ExprConstraints, candidate: &Candidate) -> bool {
    if let Candidate::Literal(ValueType::Map(element)) = candidate {
        return key.is_satisfied_by(&Candidate::Literal(ValueType::String))
            && value.is_satisfied_by(&Candidate::Literal(element.as_ref().clone()));
    }

    match candidate.as_entries() {
        Some(entries) => entries
            .iter()
            .all(|(k, v)| key.is_satisfied_by(k) && value.is_satisfied_by(v)),
        None => false,
    }
}

// =============================================================================
// Constraint Sets
// =============================================================================

/// Ordered, non-empty "one of" set of constraints.
///
/// Emptiness is checked when the owning schema tree is validated, so that the
/// error can name the offending attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExprConstraints(Vec<ExprConstraint>);

impl ExprConstraints {
    pub fn new(variants: Vec<ExprConstraint>) -> Self {
        Self(variants)
    }

    /// A set with a single variant
    pub fn one(variant: ExprConstraint) -> Self {
        Self(vec![variant])
    }

    /// Accept any expression
    pub fn any() -> Self {
        Self::one(ExprConstraint::Any)
    }

    pub fn literal(ty: ValueType) -> Self {
        Self::one(ExprConstraint::literal(ty))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Variants in declaration (completion) order
    pub fn iter(&self) -> std::slice::Iter<'_, ExprConstraint> {
        self.0.iter()
    }

    /// Check a candidate against the set, reporting the first accepting variant
    pub fn matches(&self, candidate: &Candidate) -> MatchOutcome {
        match self.0.iter().position(|variant| variant.accepts(candidate)) {
            Some(index) => MatchOutcome::Matched { index },
            None => MatchOutcome::NoMatch,
        }
    }

    pub fn is_satisfied_by(&self, candidate: &Candidate) -> bool {
        self.matches(candidate).is_match()
    }

    /// Scopes this set can traverse into, in declaration order
    pub fn traversal_scopes(&self) -> Vec<ScopeId> {
        let mut scopes = Vec::new();
        for variant in &self.0 {
            if let ExprConstraint::ScopeTraversal { scope, .. } = variant {
                if !scopes.contains(scope) {
                    scopes.push(*scope);
                }
            }
        }
        scopes
    }

    /// Visit every nested constraint set, depth first, including this one
    pub(crate) fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ExprConstraints)) {
        visit(self);
        for variant in &self.0 {
            match variant {
                ExprConstraint::Tuple { elements } => match elements {
                    TupleElements::Uniform(rule) => rule.walk(visit),
                    TupleElements::Positional(rules) => rules.iter().for_each(|r| r.walk(visit)),
                },
                ExprConstraint::Map { key, value } => {
                    key.walk(visit);
                    value.walk(visit);
                }
                ExprConstraint::Object { attributes, .. } => {
                    attributes.values().for_each(|a| a.constraints.walk(visit))
                }
                _ => {}
            }
        }
    }
}

impl From<Vec<ExprConstraint>> for ExprConstraints {
    fn from(variants: Vec<ExprConstraint>) -> Self {
        Self(variants)
    }
}

impl<'a> IntoIterator for &'a ExprConstraints {
    type Item = &'a ExprConstraint;
    type IntoIter = std::slice::Iter<'a, ExprConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of matching a candidate against a constraint set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The variant at `index` was the first to accept the candidate
    Matched { index: usize },
    /// No variant accepted the candidate; reportable as a user diagnostic
    NoMatch,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

// =============================================================================
// Candidates
// =============================================================================

/// The shape of an expression found in a document, as seen by the matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Literal of a known (or dynamic) type
    Literal(ValueType),
    /// Reference expression. `scope` is `None` when the traversal root did
    /// not resolve to any known target.
    Traversal {
        scope: Option<ScopeId>,
        ty: ValueType,
    },
    /// Type expression such as `map(string)`
    TypeExpr(ValueType),
    Tuple(Vec<Candidate>),
    Map(Vec<(Candidate, Candidate)>),
    Object(BTreeMap<String, Candidate>),
}

impl Candidate {
    /// Candidate for a literal JSON value
    pub fn literal(value: &serde_json::Value) -> Self {
        Candidate::Literal(ValueType::of_value(value))
    }

    pub fn traversal(scope: ScopeId, ty: ValueType) -> Self {
        Candidate::Traversal {
            scope: Some(scope),
            ty,
        }
    }

    /// Traversal whose root resolves to nothing
    pub fn unresolved_traversal() -> Self {
        Candidate::Traversal {
            scope: None,
            ty: ValueType::Dynamic,
        }
    }

    /// Type of this candidate if it is built from literals only
    pub fn literal_type(&self) -> Option<ValueType> {
        match self {
            Candidate::Literal(ty) => Some(ty.clone()),
            Candidate::Tuple(items) => items
                .iter()
                .map(Candidate::literal_type)
                .collect::<Option<Vec<_>>>()
                .map(ValueType::Tuple),
            Candidate::Object(attributes) => attributes
                .iter()
                .map(|(k, v)| v.literal_type().map(|t| (k.clone(), t)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(ValueType::Object),
            Candidate::Map(entries) => {
                let mut value_type: Option<ValueType> = None;
                for (key, value) in entries {
                    if !key.literal_type()?.is_assignable_to(&ValueType::String) {
                        return None;
                    }
                    let ty = value.literal_type()?;
                    value_type = match value_type {
                        Some(existing) if existing == ty => Some(existing),
                        Some(_) => Some(ValueType::Dynamic),
                        None => Some(ty),
                    };
                }
                Some(ValueType::map(value_type.unwrap_or(ValueType::Dynamic)))
            }
            Candidate::Traversal { .. } | Candidate::TypeExpr(_) => None,
        }
    }

    fn is_dynamic_literal(&self) -> bool {
        matches!(self, Candidate::Literal(ValueType::Dynamic))
    }

    fn as_items(&self) -> Option<Vec<Candidate>> {
        match self {
            Candidate::Tuple(items) => Some(items.clone()),
            Candidate::Literal(ValueType::Tuple(types)) => {
                Some(types.iter().cloned().map(Candidate::Literal).collect())
            }
            _ => None,
        }
    }

    fn as_entries(&self) -> Option<Vec<(Candidate, Candidate)>> {
        match self {
            Candidate::Map(entries) => Some(entries.clone()),
            Candidate::Object(_) | Candidate::Literal(ValueType::Object(_)) => self
                .as_attributes()
                .map(|attrs| {
                    attrs
                        .into_iter()
                        .map(|(_, v)| (Candidate::Literal(ValueType::String), v))
                        .collect()
                }),
            _ => None,
        }
    }

    fn as_attributes(&self) -> Option<BTreeMap<String, Candidate>> {
        match self {
            Candidate::Object(attributes) => Some(attributes.clone()),
            Candidate::Literal(ValueType::Object(types)) => Some(
                types
                    .iter()
                    .map(|(k, t)| (k.clone(), Candidate::Literal(t.clone())))
                    .collect(),
            ),
            _ => None,
        }
    }
}
