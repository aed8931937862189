//! Error types for schema construction
//!
//! Every variant here is an authoring defect: a bug in schema data or in a
//! version delta, detected while a tree is being built. Conditions caused by
//! incomplete user documents are never errors; see [`crate::address`] and
//! [`crate::expr`] for the typed outcomes used there.

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema construction errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unknown reference scope '{name}'")]
    UnknownScope { name: String },

    #[error("Empty constraint set at {path}")]
    EmptyConstraints { path: String },

    #[error("Address at {path} reads label {index} but the block declares {declared} label(s)")]
    LabelIndexOutOfRange {
        path: String,
        index: usize,
        declared: usize,
    },

    #[error("Address at {path} reads unknown attribute '{attribute}'")]
    UnknownAddressAttribute { path: String, attribute: String },

    #[error("Reference at {path} infers its type from unknown attribute '{attribute}'")]
    UnknownTypeSource { path: String, attribute: String },

    #[error("Address at {path} has no required step")]
    EmptyAddress { path: String },

    #[error("Attribute name step used outside an any-attribute rule at {path}")]
    MisplacedAttrNameStep { path: String },

    #[error("Open attribute rule at {path} cannot be a dependency key")]
    DependencyKeyOnAnyAttribute { path: String },

    #[error("Attribute '{name}' not found at {path}")]
    MissingAttribute { name: String, path: String },

    #[error("Block '{name}' not found at {path}")]
    MissingBlock { name: String, path: String },

    #[error("Attribute '{name}' already defined at {path}")]
    DuplicateAttribute { name: String, path: String },

    #[error("Block '{name}' already defined at {path}")]
    DuplicateBlock { name: String, path: String },

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}
