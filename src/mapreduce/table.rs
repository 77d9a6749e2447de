//! Extension registry
//!
//! Names map to loaded extensions. Registration is first-come-only; an
//! extension stays registered until shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::MapReduce;

/// Table of registered map-reduce extensions
#[derive(Default)]
pub struct FuncTable {
    funcs: BTreeMap<String, Arc<dyn MapReduce>>,
}

impl FuncTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Register an extension under a new name; fails if the name is taken
    pub fn register(&mut self, name: &str, ext: Box<dyn MapReduce>) -> bool {
        if self.funcs.contains_key(name) {
            return false;
        }
        self.funcs.insert(name.to_string(), Arc::from(ext));
        true
    }

    /// A handle to the named extension, callable without holding the table
    pub fn get(&self, name: &str) -> Option<Arc<dyn MapReduce>> {
        self.funcs.get(name).cloned()
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
