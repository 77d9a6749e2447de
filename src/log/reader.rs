//! Log Reader
//!
//! Reads records sequentially from a log file, stopping cleanly at a torn
//! trailing record.

use std::fs;
use std::path::Path;

use crate::error::{Result, VaultError};

use super::record::{LogRecord, RecordTag, HEADER_SIZE};

/// Reads records from a log file front to back
pub struct LogReader {
    data: Vec<u8>,
    pos: usize,
    truncated: bool,
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self {
            data,
            pos: 0,
            truncated: false,
        })
    }

    /// Read the next complete record
    ///
    /// Returns `Ok(None)` at end of file, or when the remaining bytes are a
    /// torn record (header or payload cut short by a crash) — the torn tail
    /// is remembered, not an error. A complete record that fails to parse
    /// is a corruption error.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        let remaining = self.data.len() - self.pos;
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < HEADER_SIZE {
            self.truncated = true;
            return Ok(None);
        }

        let header = &self.data[self.pos..self.pos + HEADER_SIZE];
        let tag_bytes = [header[0], header[1], header[2], header[3]];
        let payload_len =
            u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

        if remaining - HEADER_SIZE < payload_len {
            self.truncated = true;
            return Ok(None);
        }

        let tag = RecordTag::from_bytes(tag_bytes).ok_or_else(|| {
            VaultError::LogCorruption(format!(
                "unknown record tag {:?} at offset {}",
                tag_bytes, self.pos
            ))
        })?;

        let payload = &self.data[self.pos + HEADER_SIZE..self.pos + HEADER_SIZE + payload_len];
        let record = LogRecord::decode_payload(tag, payload)?;
        self.pos += HEADER_SIZE + payload_len;
        Ok(Some(record))
    }

    /// True if a torn trailing record was found
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Byte offset of the end of the last complete record
    pub fn valid_len(&self) -> u64 {
        self.pos as u64
    }
}
