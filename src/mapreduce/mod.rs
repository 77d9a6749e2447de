//! Map-Reduce Extension Module
//!
//! Admin-registered compute extensions executed over the key-value table.
//!
//! ## Responsibilities
//! - Hold registered extensions by unique name (register once, never replace)
//! - Load extension artifacts from shared objects
//! - Run map over every live entry, group intermediates, reduce per group
//!
//! The engine depends only on the [`MapReduce`] capability; the shared
//! object loader is one way to produce it, and tests register trait objects
//! directly.

mod loader;
mod table;

pub use loader::{SharedObjectLoader, CONSTRUCTOR_SYMBOL};
pub use table::FuncTable;

use std::collections::BTreeMap;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{Result, VaultError};
use crate::kvtable::KvTable;

/// A loaded map-reduce extension
///
/// `map` runs once per live key-value pair and may emit any number of
/// intermediate pairs; `reduce` runs once per intermediate key over the
/// collected values. Neither may touch the table it is scanning.
pub trait MapReduce: Send + Sync {
    fn map(&self, key: &str, value: &[u8]) -> Vec<(String, Vec<u8>)>;
    fn reduce(&self, key: &str, values: &[Vec<u8>]) -> Vec<u8>;
}

/// Intermediate results grouped by key, in key order
pub type Groups = BTreeMap<String, Vec<Vec<u8>>>;

/// Run the map phase over every live entry
///
/// The caller holds the table's read lock for the duration of the scan, so
/// no mutation is observable mid-scan. A panic inside the extension is
/// caught and reported as an execution failure.
pub fn map_phase(ext: &dyn MapReduce, table: &KvTable) -> Result<Groups> {
    let mut groups = Groups::new();
    for (key, entry) in table.iter() {
        let pairs = catch_unwind(AssertUnwindSafe(|| ext.map(key, &entry.value)))
            .map_err(|_| VaultError::ExtensionPanic(format!("map panicked on key {key}")))?;
        for (ikey, ivalue) in pairs {
            groups.entry(ikey).or_default().push(ivalue);
        }
    }
    Ok(groups)
}

/// Run the reduce phase and write one reduced value per line to the sink
///
/// Groups reduce in intermediate-key order, which keeps the output stable
/// across invocations over the same table state.
pub fn reduce_phase(ext: &dyn MapReduce, groups: &Groups, sink: &mut dyn Write) -> Result<()> {
    for (ikey, values) in groups {
        let reduced = catch_unwind(AssertUnwindSafe(|| ext.reduce(ikey, values)))
            .map_err(|_| VaultError::ExtensionPanic(format!("reduce panicked on key {ikey}")))?;
        sink.write_all(&reduced)?;
        sink.write_all(b"\n")?;
    }
    Ok(())
}
