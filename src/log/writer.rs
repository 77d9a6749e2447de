//! Log Writer
//!
//! Appends records durably and rewrites the log during compaction.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

use super::LogRecord;

/// Appends records to the log file
///
/// Every append is synced to disk before it returns; a failed append
/// truncates the file back to its previous length so no partial record
/// survives.
pub struct LogWriter {
    /// Path of the log file (needed for compaction's rename)
    path: PathBuf,

    /// Open append handle
    file: File,

    /// Current file length; the rollback point for failed appends
    len: u64,
}

impl LogWriter {
    /// Open the log for appending, creating it if absent
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    /// Durably append one record
    ///
    /// The record is fully on disk (written, flushed, fsynced) when this
    /// returns Ok; the in-memory mutation it describes may then apply.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        let buf = record.encode();
        let result = self
            .file
            .write_all(&buf)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data());
        if let Err(e) = result {
            // Roll back any partial bytes so the tail stays record-aligned.
            let _ = self.file.set_len(self.len);
            return Err(VaultError::LogWrite(e.to_string()));
        }
        self.len += buf.len() as u64;
        Ok(())
    }

    /// Replace the log contents with exactly the given records
    ///
    /// Writes everything to a temporary sibling file, fsyncs it, then
    /// atomically renames it over the log and reopens the append handle.
    /// Returns the new file length.
    pub fn rewrite(&mut self, records: &[LogRecord]) -> Result<u64> {
        let tmp_path = self.tmp_path();
        let mut tmp = File::create(&tmp_path)?;
        let mut written = 0u64;
        for record in records {
            let buf = record.encode();
            tmp.write_all(&buf)?;
            written += buf.len() as u64;
        }
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.len = written;
        Ok(written)
    }

    /// Force everything to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if the log holds no records
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os: OsString = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}
