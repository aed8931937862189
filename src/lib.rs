//! Terraform Configuration Schema
//!
//! A version-aware structural schema of the Terraform configuration language,
//! for editor tooling that needs to complete, validate and navigate
//! configuration documents.
//!
//! ## Features
//!
//! - **Version Gating**: one schema tree per language version, built from a
//!   0.12.0 base and a declarative list of version deltas
//! - **Expression Constraints**: closed set of accepted expression shapes per
//!   attribute, with candidate matching
//! - **Reference Addressing**: every referenceable block or attribute
//!   publishes a scope, an address template and type rules
//! - **Fingerprints and Diffs**: reproducible SHA256 fingerprints and
//!   version-to-version change reports
//!
//! ## Architecture
//!
//! ```text
//! LanguageVersion ──► SchemaBuilder (base + deltas) ──► SchemaTree
//!                           │                              │
//!                      SchemaCache                 BlockSchema / AttributeSchema
//!                                                          │
//!                                     ExprConstraints, Reference (Address, RefTypeRule)
//! ```

pub mod address;
pub mod builder;
pub mod cache;
pub mod checksum;
pub mod config;
pub mod diff;
pub mod error;
pub mod expr;
pub mod reference;
pub mod schema;
pub mod schemas;
pub mod scope;
pub mod types;
pub mod version;

pub use address::{Address, AddressResolution, AddressStep, AttrValue, BlockInstance, RefPath, UnresolvedReason};
pub use builder::{Delta, Mutation, SchemaBuilder};
pub use cache::SchemaCache;
pub use checksum::Checksum;
pub use config::ToolConfig;
pub use diff::{diff_trees, ChangeType, DiffReport, SchemaChange};
pub use error::{Result, SchemaError};
pub use expr::{Candidate, ExprConstraint, ExprConstraints, MatchOutcome, ObjectAttribute, TupleElements};
pub use reference::{RefTypeRule, Reference, ReferenceTarget, ReferenceTargets, TypeInference};
pub use schema::{AttributeSchema, BlockSchema, DependencyKeys, Description, LabelSchema, Presence, SchemaTree};
pub use scope::{ScopeId, ScopeRegistry};
pub use types::ValueType;
pub use version::LanguageVersion;

/// Build the Terraform schema tree for a language version
pub fn schema_for_version(version: &LanguageVersion) -> Result<SchemaTree> {
    SchemaBuilder::terraform().build(version)
}
