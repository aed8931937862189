//! Schema tree comparison
//!
//! Reports how the schema for one language version differs from another and
//! which of those differences can reject configurations the older schema
//! accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{AttributeSchema, BlockSchema, Presence, SchemaTree};

/// Result of comparing two schema trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    /// Whether configurations valid under the old tree stay valid
    pub is_compatible: bool,
    pub changes: Vec<SchemaChange>,
    pub summary: String,
}

impl DiffReport {
    /// Build a report; in strict mode any change counts as incompatible
    pub fn new(changes: Vec<SchemaChange>, strict: bool) -> Self {
        let breaking = changes.iter().filter(|c| c.is_breaking).count();

        let (is_compatible, summary) = if strict && !changes.is_empty() {
            (false, format!("Strict mode: {} changes detected", changes.len()))
        } else if breaking > 0 {
            (false, format!("{} breaking changes detected", breaking))
        } else if changes.is_empty() {
            (true, "No changes detected".to_string())
        } else {
            (true, format!("{} compatible changes detected", changes.len()))
        };

        Self {
            is_compatible,
            changes,
            summary,
        }
    }

    pub fn compare(old: &SchemaTree, new: &SchemaTree, strict: bool) -> Self {
        Self::new(diff_trees(old, new), strict)
    }
}

/// A detected change between two trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub change_type: ChangeType,
    /// Dotted path of the changed element, e.g. `resource.for_each`
    pub path: String,
    pub is_breaking: bool,
    pub description: String,
}

/// Type of schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    AttributeAdded,
    AttributeRemoved,
    /// The set of accepted expressions changed
    ConstraintsChanged,
    /// Required <-> optional
    OptionalityChanged,
    BlockAdded,
    BlockRemoved,
    /// Labels, item limit or published reference changed
    BlockChanged,
    DocumentationChanged,
}

/// Compare two trees, reporting changes in path order
pub fn diff_trees(old: &SchemaTree, new: &SchemaTree) -> Vec<SchemaChange> {
    let mut changes = Vec::new();
    diff_block_maps(&old.blocks, &new.blocks, "", &mut changes);
    changes
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn diff_block_maps(
    old: &BTreeMap<String, BlockSchema>,
    new: &BTreeMap<String, BlockSchema>,
    prefix: &str,
    changes: &mut Vec<SchemaChange>,
) {
    for (name, old_block) in old {
        let path = join(prefix, name);
        match new.get(name) {
            Some(new_block) => diff_blocks(old_block, new_block, &path, changes),
            None => changes.push(SchemaChange {
                change_type: ChangeType::BlockRemoved,
                path: path.clone(),
                is_breaking: true,
                description: format!("Block '{}' was removed", path),
            }),
        }
    }

    for name in new.keys().filter(|name| !old.contains_key(*name)) {
        let path = join(prefix, name);
        changes.push(SchemaChange {
            change_type: ChangeType::BlockAdded,
            path: path.clone(),
            is_breaking: false,
            description: format!("Block '{}' was added", path),
        });
    }
}

fn diff_blocks(old: &BlockSchema, new: &BlockSchema, path: &str, changes: &mut Vec<SchemaChange>) {
    if old.labels.len() != new.labels.len()
        || old.labels.iter().zip(&new.labels).any(|(a, b)| a.name != b.name)
    {
        changes.push(SchemaChange {
            change_type: ChangeType::BlockChanged,
            path: path.to_string(),
            is_breaking: true,
            description: format!("Labels of block '{}' changed", path),
        });
    }

    if old.max_items != new.max_items {
        // lifting or raising the limit only admits more documents
        let tightened = match (old.max_items, new.max_items) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(before), Some(after)) => after < before,
        };
        changes.push(SchemaChange {
            change_type: ChangeType::BlockChanged,
            path: path.to_string(),
            is_breaking: tightened,
            description: format!(
                "Item limit of block '{}' changed from {} to {}",
                path,
                limit(old.max_items),
                limit(new.max_items)
            ),
        });
    }

    if old.reference != new.reference {
        changes.push(SchemaChange {
            change_type: ChangeType::BlockChanged,
            path: path.to_string(),
            is_breaking: old.reference.is_some(),
            description: format!("Reference published by block '{}' changed", path),
        });
    }

    if old.description != new.description {
        changes.push(documentation_changed(path));
    }

    for (name, old_attr) in &old.attributes {
        let attr_path = join(path, name);
        match new.attributes.get(name) {
            Some(new_attr) => diff_attributes(old_attr, new_attr, &attr_path, changes),
            None => changes.push(SchemaChange {
                change_type: ChangeType::AttributeRemoved,
                path: attr_path.clone(),
                is_breaking: true,
                description: format!("Attribute '{}' was removed", attr_path),
            }),
        }
    }

    for (name, new_attr) in new.attributes.iter().filter(|(name, _)| !old.attributes.contains_key(*name)) {
        let attr_path = join(path, name);
        changes.push(SchemaChange {
            change_type: ChangeType::AttributeAdded,
            path: attr_path.clone(),
            is_breaking: new_attr.is_required(),
            description: if new_attr.is_required() {
                format!("Required attribute '{}' was added (breaking)", attr_path)
            } else {
                format!("Optional attribute '{}' was added", attr_path)
            },
        });
    }

    let any_path = join(path, "*");
    match (old.any_attribute(), new.any_attribute()) {
        (Some(old_attr), Some(new_attr)) => diff_attributes(old_attr, new_attr, &any_path, changes),
        (Some(_), None) => changes.push(SchemaChange {
            change_type: ChangeType::AttributeRemoved,
            path: any_path.clone(),
            is_breaking: true,
            description: format!("Open attribute rule of '{}' was removed", path),
        }),
        (None, Some(_)) => changes.push(SchemaChange {
            change_type: ChangeType::AttributeAdded,
            path: any_path.clone(),
            is_breaking: false,
            description: format!("Open attribute rule of '{}' was added", path),
        }),
        (None, None) => {}
    }

    diff_block_maps(&old.blocks, &new.blocks, path, changes);
}

fn diff_attributes(
    old: &AttributeSchema,
    new: &AttributeSchema,
    path: &str,
    changes: &mut Vec<SchemaChange>,
) {
    if old.constraints != new.constraints {
        // every previously accepted variant still present: the set only widened
        let narrowed = old
            .constraints
            .iter()
            .any(|variant| !new.constraints.iter().any(|v| v == variant));
        changes.push(SchemaChange {
            change_type: ChangeType::ConstraintsChanged,
            path: path.to_string(),
            is_breaking: narrowed,
            description: if narrowed {
                format!("Accepted expressions of '{}' were narrowed", path)
            } else {
                format!("Accepted expressions of '{}' were widened", path)
            },
        });
    }

    if old.is_required() != new.is_required() {
        changes.push(SchemaChange {
            change_type: ChangeType::OptionalityChanged,
            path: path.to_string(),
            is_breaking: new.is_required(),
            description: format!(
                "Attribute '{}' changed from {} to {}",
                path,
                presence(&old.presence),
                presence(&new.presence)
            ),
        });
    }

    if old.description != new.description {
        changes.push(documentation_changed(path));
    }
}

fn documentation_changed(path: &str) -> SchemaChange {
    SchemaChange {
        change_type: ChangeType::DocumentationChanged,
        path: path.to_string(),
        is_breaking: false,
        description: format!("Description of '{}' changed", path),
    }
}

fn presence(presence: &Presence) -> &'static str {
    match presence {
        Presence::Required => "required",
        Presence::Optional | Presence::Defaulted(_) => "optional",
    }
}

fn limit(max_items: Option<u64>) -> String {
    max_items.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}
