//! Version-gated schema builder
//!
//! Schema evolution is a declarative list of `(threshold, mutation)` deltas
//! folded over the base schema of the earliest supported version. Building
//! is a pure function of the version: the same version always yields the
//! same tree.

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::expr::ExprConstraints;
use crate::schema::{AttributeSchema, BlockSchema, SchemaTree};
use crate::version::{core_of, LanguageVersion};

// =============================================================================
// Deltas
// =============================================================================

/// A structural change to the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddAttribute {
        name: String,
        attribute: AttributeSchema,
    },
    RemoveAttribute {
        name: String,
    },
    ReplaceConstraints {
        name: String,
        constraints: ExprConstraints,
    },
    AddBlock {
        name: String,
        block: BlockSchema,
    },
    ReplaceBlock {
        name: String,
        block: BlockSchema,
    },
}

/// A mutation applied to the block at `target` from `threshold` onwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub threshold: Version,
    /// Path of the block the mutation applies to; empty for top-level blocks
    pub target: Vec<String>,
    pub mutation: Mutation,
}

impl Delta {
    pub fn new(threshold: Version, target: &[&str], mutation: Mutation) -> Self {
        Self {
            threshold,
            target: target.iter().map(|s| s.to_string()).collect(),
            mutation,
        }
    }

    pub fn add_attribute(
        threshold: Version,
        target: &[&str],
        name: &str,
        attribute: AttributeSchema,
    ) -> Self {
        Self::new(
            threshold,
            target,
            Mutation::AddAttribute {
                name: name.to_string(),
                attribute,
            },
        )
    }

    pub fn remove_attribute(threshold: Version, target: &[&str], name: &str) -> Self {
        Self::new(
            threshold,
            target,
            Mutation::RemoveAttribute {
                name: name.to_string(),
            },
        )
    }

    pub fn replace_constraints(
        threshold: Version,
        target: &[&str],
        name: &str,
        constraints: ExprConstraints,
    ) -> Self {
        Self::new(
            threshold,
            target,
            Mutation::ReplaceConstraints {
                name: name.to_string(),
                constraints,
            },
        )
    }

    pub fn add_block(threshold: Version, target: &[&str], name: &str, block: BlockSchema) -> Self {
        Self::new(
            threshold,
            target,
            Mutation::AddBlock {
                name: name.to_string(),
                block,
            },
        )
    }

    pub fn replace_block(threshold: Version, target: &[&str], name: &str, block: BlockSchema) -> Self {
        Self::new(
            threshold,
            target,
            Mutation::ReplaceBlock {
                name: name.to_string(),
                block,
            },
        )
    }

    /// Dotted path of the element the mutation touches, for logs and errors
    pub fn element_path(&self) -> String {
        let name = match &self.mutation {
            Mutation::AddAttribute { name, .. }
            | Mutation::RemoveAttribute { name }
            | Mutation::ReplaceConstraints { name, .. }
            | Mutation::AddBlock { name, .. }
            | Mutation::ReplaceBlock { name, .. } => name,
        };
        let mut segments = self.target.clone();
        segments.push(name.clone());
        segments.join(".")
    }

    fn target_path(&self) -> String {
        if self.target.is_empty() {
            "<root>".to_string()
        } else {
            self.target.join(".")
        }
    }

    fn applies_to(&self, version: &LanguageVersion) -> bool {
        version.is_at_least(&self.threshold)
    }

    fn apply(&self, tree: &mut SchemaTree) -> Result<()> {
        let target_path = self.target_path();

        match &self.mutation {
            Mutation::AddBlock { name, block } | Mutation::ReplaceBlock { name, block } => {
                let blocks = tree
                    .blocks_at_mut(&self.target)
                    .ok_or_else(|| missing_target(&self.target))?;
                let exists = blocks.contains_key(name);
                match (&self.mutation, exists) {
                    (Mutation::AddBlock { .. }, true) => {
                        return Err(SchemaError::DuplicateBlock {
                            name: name.clone(),
                            path: target_path,
                        })
                    }
                    (Mutation::ReplaceBlock { .. }, false) => {
                        return Err(SchemaError::MissingBlock {
                            name: name.clone(),
                            path: target_path,
                        })
                    }
                    _ => {}
                }
                blocks.insert(name.clone(), block.clone());
            }

            Mutation::AddAttribute { name, attribute } => {
                let block = tree
                    .block_at_mut(&self.target)
                    .ok_or_else(|| missing_target(&self.target))?;
                if block.attributes.contains_key(name) {
                    return Err(SchemaError::DuplicateAttribute {
                        name: name.clone(),
                        path: target_path,
                    });
                }
                block.attributes.insert(name.clone(), attribute.clone());
            }

            Mutation::RemoveAttribute { name } => {
                let block = tree
                    .block_at_mut(&self.target)
                    .ok_or_else(|| missing_target(&self.target))?;
                if block.attributes.remove(name).is_none() {
                    return Err(SchemaError::MissingAttribute {
                        name: name.clone(),
                        path: target_path,
                    });
                }
            }

            Mutation::ReplaceConstraints { name, constraints } => {
                let block = tree
                    .block_at_mut(&self.target)
                    .ok_or_else(|| missing_target(&self.target))?;
                match block.attributes.get_mut(name) {
                    Some(attribute) => attribute.constraints = constraints.clone(),
                    None => {
                        return Err(SchemaError::MissingAttribute {
                            name: name.clone(),
                            path: target_path,
                        })
                    }
                }
            }
        }

        Ok(())
    }
}

fn missing_target(target: &[String]) -> SchemaError {
    let (name, parent) = match target.split_last() {
        Some((name, parent)) => (name.clone(), parent.join(".")),
        None => (String::new(), String::new()),
    };
    SchemaError::MissingBlock {
        name,
        path: if parent.is_empty() {
            "<root>".to_string()
        } else {
            parent
        },
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Produces the schema tree valid for a language version
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    base_version: Version,
    base: SchemaTree,
    deltas: Vec<Delta>,
}

impl SchemaBuilder {
    /// Create a builder from a base schema and its deltas.
    ///
    /// Deltas are stably sorted by threshold, so deltas sharing a threshold
    /// keep their relative order.
    pub fn new(base_version: Version, base: SchemaTree, mut deltas: Vec<Delta>) -> Self {
        deltas.sort_by(|a, b| core_of(&a.threshold).cmp(&core_of(&b.threshold)));
        Self {
            base_version,
            base,
            deltas,
        }
    }

    /// Builder for the built-in Terraform schema
    pub fn terraform() -> Self {
        crate::schemas::builder()
    }

    pub fn base_version(&self) -> &Version {
        &self.base_version
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    /// Distinct thresholds in ascending order
    pub fn thresholds(&self) -> Vec<Version> {
        let mut thresholds: Vec<Version> = Vec::new();
        for delta in &self.deltas {
            if thresholds.last().map(core_of) != Some(core_of(&delta.threshold)) {
                thresholds.push(delta.threshold.clone());
            }
        }
        thresholds
    }

    /// Build the schema tree for a version.
    ///
    /// Versions above every threshold receive all deltas. Versions below the
    /// base receive the base schema unchanged.
    pub fn build(&self, version: &LanguageVersion) -> Result<SchemaTree> {
        if !version.is_at_least(&self.base_version) {
            warn!(
                version = %version,
                base = %self.base_version,
                "version predates the base schema, using base schema"
            );
        }

        let mut tree = self.base.clone();
        for delta in self.deltas.iter().take_while(|d| d.applies_to(version)) {
            debug!(
                threshold = %delta.threshold,
                element = %delta.element_path(),
                "applying schema delta"
            );
            delta.apply(&mut tree)?;
        }

        tree.validate()?;
        Ok(tree)
    }

    /// Parse a version string and build its tree
    pub fn build_str(&self, version: &str) -> Result<SchemaTree> {
        self.build(&LanguageVersion::parse(version)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Description;
    use crate::types::ValueType;

    fn base() -> SchemaTree {
        SchemaTree::new().with_block(
            "widget",
            BlockSchema::new(Description::plain("Widget"))
                .with_attribute("size", AttributeSchema::optional(ExprConstraints::literal(ValueType::Number)))
                .with_attribute("legacy", AttributeSchema::optional(ExprConstraints::literal(ValueType::String))),
        )
    }

    fn builder(deltas: Vec<Delta>) -> SchemaBuilder {
        SchemaBuilder::new(Version::new(1, 0, 0), base(), deltas)
    }

    fn version(s: &str) -> LanguageVersion {
        LanguageVersion::parse(s).unwrap()
    }

    #[test]
    fn test_deltas_apply_at_threshold() {
        let b = builder(vec![Delta::add_attribute(
            Version::new(1, 2, 0),
            &["widget"],
            "color",
            AttributeSchema::optional(ExprConstraints::literal(ValueType::String)),
        )]);

        assert!(b.build(&version("1.1.9")).unwrap().block("widget").unwrap().attribute("color").is_none());
        assert!(b.build(&version("1.2.0")).unwrap().block("widget").unwrap().attribute("color").is_some());
        assert!(b.build(&version("9.0.0")).unwrap().block("widget").unwrap().attribute("color").is_some());
    }

    #[test]
    fn test_deltas_sorted_stably() {
        let b = builder(vec![
            Delta::remove_attribute(Version::new(2, 0, 0), &["widget"], "legacy"),
            Delta::add_attribute(
                Version::new(1, 5, 0),
                &["widget"],
                "shape",
                AttributeSchema::optional(ExprConstraints::literal(ValueType::String)),
            ),
            Delta::replace_constraints(
                Version::new(1, 5, 0),
                &["widget"],
                "shape",
                ExprConstraints::literal(ValueType::Dynamic),
            ),
        ]);

        assert_eq!(b.thresholds(), vec![Version::new(1, 5, 0), Version::new(2, 0, 0)]);

        let tree = b.build(&version("2.0.0")).unwrap();
        let widget = tree.block("widget").unwrap();
        assert!(widget.attribute("legacy").is_none());
        assert_eq!(
            widget.attribute("shape").unwrap().constraints,
            ExprConstraints::literal(ValueType::Dynamic)
        );
    }

    #[test]
    fn test_removing_missing_attribute_is_authoring_defect() {
        let b = builder(vec![Delta::remove_attribute(Version::new(1, 1, 0), &["widget"], "nope")]);

        assert!(b.build(&version("1.0.0")).is_ok());
        match b.build(&version("1.1.0")).unwrap_err() {
            SchemaError::MissingAttribute { name, path } => {
                assert_eq!(name, "nope");
                assert_eq!(path, "widget");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_target_block() {
        let b = builder(vec![Delta::add_attribute(
            Version::new(1, 0, 0),
            &["widget", "inner"],
            "x",
            AttributeSchema::optional(ExprConstraints::any()),
        )]);
        assert!(matches!(
            b.build(&version("1.0.0")).unwrap_err(),
            SchemaError::MissingBlock { .. }
        ));
    }

    #[test]
    fn test_block_add_and_replace() {
        let b = builder(vec![
            Delta::add_block(Version::new(1, 1, 0), &[], "gadget", BlockSchema::default()),
            Delta::replace_block(
                Version::new(1, 2, 0),
                &[],
                "gadget",
                BlockSchema::default().with_max_items(1),
            ),
            Delta::add_block(Version::new(1, 3, 0), &[], "gadget", BlockSchema::default()),
        ]);

        assert!(b.build(&version("1.0.0")).unwrap().block("gadget").is_none());
        assert_eq!(b.build(&version("1.1.0")).unwrap().block("gadget").unwrap().max_items(), None);
        assert_eq!(b.build(&version("1.2.0")).unwrap().block("gadget").unwrap().max_items(), Some(1));
        assert!(matches!(
            b.build(&version("1.3.0")).unwrap_err(),
            SchemaError::DuplicateBlock { .. }
        ));
    }

    #[test]
    fn test_build_is_reproducible() {
        let b = builder(vec![Delta::remove_attribute(Version::new(1, 1, 0), &["widget"], "legacy")]);
        let first = b.build(&version("1.4.0")).unwrap();
        let second = b.build(&version("1.4.0")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    }

    #[test]
    fn test_old_version_gets_base() {
        let b = builder(vec![]);
        assert_eq!(b.build(&version("0.9.0")).unwrap(), base());
    }
}
