//! Shared object loader
//!
//! Turns an uploaded extension artifact into a live [`MapReduce`]
//! implementation via dynamic library loading.

use std::fs;
use std::path::PathBuf;

use libloading::{Library, Symbol};

use crate::error::{Result, VaultError};

use super::MapReduce;

/// Constructor symbol every extension artifact must export
pub const CONSTRUCTOR_SYMBOL: &[u8] = b"vaultkv_extension";

type Constructor = unsafe fn() -> Box<dyn MapReduce>;

/// Loads extension artifacts from shared objects on disk
///
/// Uploaded artifact bytes are written under the extensions directory and
/// opened with the platform loader. Every `Library` stays open for the life
/// of the loader: the extension's code lives inside it, so the library must
/// outlive every extension it produced.
pub struct SharedObjectLoader {
    dir: PathBuf,
    next_id: u64,
    libraries: Vec<Library>,
}

impl SharedObjectLoader {
    /// Create a loader writing artifacts under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: 0,
            libraries: Vec::new(),
        }
    }

    /// Load an extension from uploaded artifact bytes
    pub fn load(&mut self, object: &[u8]) -> Result<Box<dyn MapReduce>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("ext-{}.so", self.next_id));
        self.next_id += 1;
        fs::write(&path, object)?;

        // Safety: loading runs arbitrary initialization code from the
        // artifact; only admin-supplied artifacts reach this point.
        let library = unsafe { Library::new(&path) }
            .map_err(|e| VaultError::ExtensionLoad(format!("{}: {e}", path.display())))?;

        let ext = unsafe {
            let ctor: Symbol<Constructor> = library
                .get(CONSTRUCTOR_SYMBOL)
                .map_err(|e| VaultError::ExtensionLoad(format!("{}: {e}", path.display())))?;
            ctor()
        };

        self.libraries.push(library);
        Ok(ext)
    }

    /// Number of libraries held open
    pub fn loaded_count(&self) -> usize {
        self.libraries.len()
    }
}
