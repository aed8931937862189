//! Language versions and gating thresholds

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SchemaError};

/// Earliest language version the built-in schema describes
pub const V0_12_0: Version = Version::new(0, 12, 0);
/// `for_each` on resources and data sources
pub const V0_12_6: Version = Version::new(0, 12, 6);
/// `experiments` in the `terraform` block
pub const V0_12_18: Version = Version::new(0, 12, 18);
/// Object entries in `required_providers`
pub const V0_12_20: Version = Version::new(0, 12, 20);
/// Module `count`/`for_each`/`depends_on`, provider `source` addresses
pub const V0_13_0: Version = Version::new(0, 13, 0);

/// The (major, minor, patch) triple used for gating
pub type CoreVersion = (u64, u64, u64);

/// Version of the host configuration language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageVersion {
    pub version: Version,
}

impl LanguageVersion {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// Parse a version string.
    ///
    /// Accepts a leading `v` and the two-component form (`0.13`), which is
    /// read as patch zero.
    pub fn parse(version_str: &str) -> Result<Self> {
        let trimmed = version_str.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(SchemaError::InvalidVersion(version_str.to_string()));
        }

        let core_end = trimmed.find(|c: char| c == '-' || c == '+').unwrap_or(trimmed.len());
        let normalized = match trimmed[..core_end].matches('.').count() {
            1 => format!("{}.0{}", &trimmed[..core_end], &trimmed[core_end..]),
            _ => trimmed.to_string(),
        };

        Ok(Self::new(Version::parse(&normalized)?))
    }

    /// Triple used for gating; pre-release and build metadata are ignored
    pub fn core(&self) -> CoreVersion {
        core_of(&self.version)
    }

    /// Check whether this version is at or above a gating threshold
    pub fn is_at_least(&self, threshold: &Version) -> bool {
        self.core() >= core_of(threshold)
    }
}

/// Gating triple of any semver version
pub fn core_of(version: &Version) -> CoreVersion {
    (version.major, version.minor, version.patch)
}

impl From<Version> for LanguageVersion {
    fn from(version: Version) -> Self {
        Self::new(version)
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
