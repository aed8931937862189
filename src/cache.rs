//! Schema cache
//!
//! Built trees keyed by the gating triple of their version. Builds run
//! outside the lock; if two threads build the same version concurrently the
//! first tree published is kept and both callers receive it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::builder::SchemaBuilder;
use crate::error::Result;
use crate::schema::SchemaTree;
use crate::version::{CoreVersion, LanguageVersion};

/// Shared cache of built schema trees
pub struct SchemaCache {
    builder: SchemaBuilder,
    trees: RwLock<HashMap<CoreVersion, Arc<SchemaTree>>>,
}

impl SchemaCache {
    pub fn new(builder: SchemaBuilder) -> Self {
        Self {
            builder,
            trees: RwLock::new(HashMap::new()),
        }
    }

    /// Cache over the built-in Terraform schema
    pub fn terraform() -> Self {
        Self::new(SchemaBuilder::terraform())
    }

    /// Get the tree for a version, building it on first use
    pub fn get_or_build(&self, version: &LanguageVersion) -> Result<Arc<SchemaTree>> {
        let key = version.core();

        if let Some(tree) = self.get(key) {
            trace!(version = %version, "schema cache hit");
            return Ok(tree);
        }

        let built = Arc::new(self.builder.build(version)?);

        let mut trees = self.trees.write().unwrap_or_else(|e| e.into_inner());
        let tree = trees.entry(key).or_insert_with(|| {
            debug!(version = %version, "caching schema tree");
            built
        });
        Ok(Arc::clone(tree))
    }

    fn get(&self, key: CoreVersion) -> Option<Arc<SchemaTree>> {
        let trees = self.trees.read().unwrap_or_else(|e| e.into_inner());
        trees.get(&key).cloned()
    }

    /// Number of cached trees
    pub fn len(&self) -> usize {
        self.trees.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.trees.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
