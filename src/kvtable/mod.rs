//! Key-Value Table Module
//!
//! The shared key-value namespace visible to every authenticated user.
//!
//! ## Responsibilities
//! - At most one live entry per key
//! - Upsert semantics that report which case occurred
//! - Most-recently-touched ranking for top-key queries
//!
//! ## Data Structure Choice
//! BTreeMap keyed by name with a monotonic touch counter stamped on every
//! insert and update. Ranking a top-keys query is a sort over the live
//! stamps, so reads never mutate the table.

mod table;

pub use table::KvTable;

use bytes::Bytes;

/// One live key-value entry
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    /// The stored value
    pub value: Bytes,

    /// Stamp from the table's touch counter; higher means touched later
    pub touched: u64,
}
