//! Reference Scope Registry
//!
//! The fixed catalogue of symbol categories a block or attribute can publish
//! into. The set is closed: scopes are an enum, so an undefined scope cannot be
//! named from Rust code, and parsing an unknown name from text is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// A category of exported symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScopeId {
    /// `data "type" "name"` blocks
    Datasource,
    /// Entries of a `locals` block
    Local,
    /// `module "name"` blocks
    Module,
    /// `output "name"` blocks
    Output,
    /// `provider "name"` blocks
    Provider,
    /// `resource "type" "name"` blocks
    Resource,
    /// `variable "name"` blocks
    Variable,
}

impl ScopeId {
    /// Every registered scope, in name order
    pub const ALL: [ScopeId; 7] = [
        ScopeId::Datasource,
        ScopeId::Local,
        ScopeId::Module,
        ScopeId::Output,
        ScopeId::Provider,
        ScopeId::Resource,
        ScopeId::Variable,
    ];

    /// Get the registered name of this scope
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeId::Datasource => "datasource",
            ScopeId::Local => "local",
            ScopeId::Module => "module",
            ScopeId::Output => "output",
            ScopeId::Provider => "provider",
            ScopeId::Resource => "resource",
            ScopeId::Variable => "variable",
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScopeRegistry::lookup(s).ok_or_else(|| SchemaError::UnknownScope {
            name: s.to_string(),
        })
    }
}

impl TryFrom<String> for ScopeId {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScopeId> for String {
    fn from(scope: ScopeId) -> Self {
        scope.as_str().to_string()
    }
}

/// Lookup over the closed set of scopes
pub struct ScopeRegistry;

impl ScopeRegistry {
    /// Resolve a scope name
    pub fn lookup(name: &str) -> Option<ScopeId> {
        match name {
            "datasource" => Some(ScopeId::Datasource),
            "local" => Some(ScopeId::Local),
            "module" => Some(ScopeId::Module),
            "output" => Some(ScopeId::Output),
            "provider" => Some(ScopeId::Provider),
            "resource" => Some(ScopeId::Resource),
            "variable" => Some(ScopeId::Variable),
            _ => None,
        }
    }

    /// Check whether a scope name is registered
    pub fn contains(name: &str) -> bool {
        Self::lookup(name).is_some()
    }

    /// All registered scopes
    pub fn scopes() -> &'static [ScopeId] {
        &ScopeId::ALL
    }
}
