//! Checksum utilities for schema tree reproducibility

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::schema::SchemaTree;

/// SHA256 checksum of a serialized schema tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute the checksum of a schema tree.
    ///
    /// Trees store every map as a `BTreeMap`, so the JSON form is already
    /// canonical.
    pub fn of_tree(tree: &SchemaTree) -> Result<Self> {
        let canonical = serde_json::to_vec(tree)?;
        Ok(Self::from_bytes(&canonical))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display, first 12 hex digits
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
