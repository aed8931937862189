//! Value types
//!
//! The type lattice used by literal and traversal constraints. `Dynamic`
//! stands for "any type" on the declared side and "not yet known" on the
//! candidate side; it is assignable in both directions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type of a configuration value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Dynamic,
    String,
    Number,
    Bool,
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>),
    Tuple(Vec<ValueType>),
    Object(BTreeMap<String, ValueType>),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn set(element: ValueType) -> Self {
        ValueType::Set(Box::new(element))
    }

    pub fn map(element: ValueType) -> Self {
        ValueType::Map(Box::new(element))
    }

    pub fn object<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, ValueType)>,
        K: Into<String>,
    {
        ValueType::Object(attributes.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ValueType::Dynamic)
    }

    /// Infer the type of a literal JSON value.
    ///
    /// Arrays become tuples and objects become objects, matching how HCL
    /// types bracket and brace literals before any conversion. `null` has no
    /// type of its own and is treated as dynamic.
    pub fn of_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ValueType::Dynamic,
            serde_json::Value::Bool(_) => ValueType::Bool,
            serde_json::Value::Number(_) => ValueType::Number,
            serde_json::Value::String(_) => ValueType::String,
            serde_json::Value::Array(items) => {
                ValueType::Tuple(items.iter().map(ValueType::of_value).collect())
            }
            serde_json::Value::Object(fields) => ValueType::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), ValueType::of_value(v)))
                    .collect(),
            ),
        }
    }

    /// Check whether a value of this type is acceptable where `target` is
    /// declared.
    pub fn is_assignable_to(&self, target: &ValueType) -> bool {
        use ValueType::*;

        match (self, target) {
            (_, Dynamic) | (Dynamic, _) => true,
            (String, String) | (Number, Number) | (Bool, Bool) => true,

            (List(s), List(t)) | (Set(s), Set(t)) | (Map(s), Map(t)) => s.is_assignable_to(t),
            (Tuple(elements), List(t)) | (Tuple(elements), Set(t)) => {
                elements.iter().all(|e| e.is_assignable_to(t))
            }
            (Object(attributes), Map(t)) => attributes.values().all(|a| a.is_assignable_to(t)),

            (Tuple(s), Tuple(t)) => {
                s.len() == t.len() && s.iter().zip(t).all(|(a, b)| a.is_assignable_to(b))
            }
            (Object(s), Object(t)) => {
                s.len() == t.len()
                    && t.iter()
                        .all(|(name, ty)| s.get(name).is_some_and(|a| a.is_assignable_to(ty)))
            }

            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Dynamic => write!(f, "any"),
            ValueType::String => write!(f, "string"),
            ValueType::Number => write!(f, "number"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::List(t) => write!(f, "list({})", t),
            ValueType::Set(t) => write!(f, "set({})", t),
            ValueType::Map(t) => write!(f, "map({})", t),
            ValueType::Tuple(elements) => {
                write!(f, "tuple([")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "])")
            }
            ValueType::Object(attributes) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in attributes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, ty)?;
                }
                write!(f, "}})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dynamic_is_assignable_both_ways() {
        assert!(ValueType::String.is_assignable_to(&ValueType::Dynamic));
        assert!(ValueType::Dynamic.is_assignable_to(&ValueType::Number));
        assert!(ValueType::set(ValueType::String).is_assignable_to(&ValueType::set(ValueType::Dynamic)));
    }

    #[test]
    fn test_primitives_do_not_convert() {
        assert!(!ValueType::Number.is_assignable_to(&ValueType::String));
        assert!(!ValueType::Bool.is_assignable_to(&ValueType::Number));
    }

    #[test]
    fn test_structural_container_assignability() {
        let tuple = ValueType::of_value(&json!(["a", "b"]));
        assert!(tuple.is_assignable_to(&ValueType::list(ValueType::String)));
        assert!(tuple.is_assignable_to(&ValueType::set(ValueType::Dynamic)));
        assert!(!tuple.is_assignable_to(&ValueType::list(ValueType::Number)));

        let object = ValueType::of_value(&json!({"a": 1, "b": 2}));
        assert!(object.is_assignable_to(&ValueType::map(ValueType::Number)));
        assert!(!object.is_assignable_to(&ValueType::set(ValueType::Dynamic)));
    }

    #[test]
    fn test_object_requires_same_attributes() {
        let declared = ValueType::object([("name", ValueType::String)]);
        assert!(ValueType::of_value(&json!({"name": "x"})).is_assignable_to(&declared));
        assert!(!ValueType::of_value(&json!({"name": "x", "extra": 1})).is_assignable_to(&declared));
        assert!(!ValueType::of_value(&json!({})).is_assignable_to(&declared));
    }

    #[test]
    fn test_display_uses_type_expression_syntax() {
        assert_eq!(ValueType::set(ValueType::Dynamic).to_string(), "set(any)");
        assert_eq!(
            ValueType::object([("a", ValueType::String)]).to_string(),
            "object({a=string})"
        );
    }
}
