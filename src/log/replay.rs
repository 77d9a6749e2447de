//! Log Replay
//!
//! Rebuilds the live tables from the log on startup.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{Result, VaultError};
use crate::kvtable::KvTable;
use crate::registry::{User, UserTable};

use super::{LogReader, LogRecord};

/// Result of a replay pass
#[derive(Debug)]
pub struct ReplayStats {
    /// Number of records applied
    pub records_applied: u64,

    /// Whether a torn trailing record was dropped
    pub was_truncated: bool,

    /// Byte offset of the end of the last complete record
    pub valid_len: u64,
}

/// Replays a log file into fresh tables
pub struct LogReplay;

impl LogReplay {
    /// Rebuild the user registry and key-value table from the log
    ///
    /// Records apply in file order; the end state is the live state. A torn
    /// trailing record is cut off the file so later appends stay aligned.
    /// Key-value replays bump the touch counter in log order, which equals
    /// touch order, so the top-keys ranking survives recovery.
    pub fn run(path: &Path) -> Result<(UserTable, KvTable, ReplayStats)> {
        let mut reader = LogReader::open(path)?;
        let mut users = UserTable::new();
        let mut kv = KvTable::new();
        let mut applied = 0u64;

        while let Some(record) = reader.next_record()? {
            Self::apply(record, &mut users, &mut kv)?;
            applied += 1;
        }

        let stats = ReplayStats {
            records_applied: applied,
            was_truncated: reader.truncated(),
            valid_len: reader.valid_len(),
        };

        if stats.was_truncated {
            tracing::warn!(
                "dropping torn record at end of {} (keeping {} bytes)",
                path.display(),
                stats.valid_len
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(stats.valid_len)?;
            file.sync_all()?;
        }

        Ok((users, kv, stats))
    }

    /// Apply one record to the tables being rebuilt
    fn apply(record: LogRecord, users: &mut UserTable, kv: &mut KvTable) -> Result<()> {
        match record {
            LogRecord::UserCreated {
                name,
                digest,
                content,
            } => {
                let inserted = users.insert(User {
                    name: name.clone(),
                    digest,
                    content,
                });
                if !inserted {
                    return Err(VaultError::LogCorruption(format!(
                        "duplicate user record for {name}"
                    )));
                }
            }
            LogRecord::ContentSet { name, data } => {
                if !users.set_content(&name, data) {
                    return Err(VaultError::LogCorruption(format!(
                        "content record for unknown user {name}"
                    )));
                }
            }
            LogRecord::KvInsert { key, value } | LogRecord::KvUpdate { key, value } => {
                kv.upsert(key, value);
            }
            LogRecord::KvDelete { key } => {
                if !kv.remove(&key) {
                    return Err(VaultError::LogCorruption(format!(
                        "delete record for unknown key {key}"
                    )));
                }
            }
        }
        Ok(())
    }
}
