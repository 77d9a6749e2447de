//! Log record definitions
//!
//! Defines the durable unit of change and its exact byte layout. The
//! encoded sizes are part of the external contract: compaction produces a
//! file whose length is the sum of the per-record sizes below, so every
//! byte here is accounted for.

use bytes::Bytes;

use crate::error::{Result, VaultError};
use crate::registry::DIGEST_LEN;

/// Header size: 4-byte record tag + 4-byte payload length
pub const HEADER_SIZE: usize = 8;

/// Length prefix size for variable payload fields
pub const FIELD_PREFIX_SIZE: usize = 4;

/// Record type tags (4 ASCII bytes each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTag {
    UserCreated,
    ContentSet,
    KvInsert,
    KvUpdate,
    KvDelete,
}

impl RecordTag {
    /// The on-disk tag bytes
    pub fn bytes(self) -> [u8; 4] {
        match self {
            RecordTag::UserCreated => *b"USRC",
            RecordTag::ContentSet => *b"CSET",
            RecordTag::KvInsert => *b"KINS",
            RecordTag::KvUpdate => *b"KUPD",
            RecordTag::KvDelete => *b"KDEL",
        }
    }

    /// Parse tag bytes read from disk
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        match &bytes {
            b"USRC" => Some(RecordTag::UserCreated),
            b"CSET" => Some(RecordTag::ContentSet),
            b"KINS" => Some(RecordTag::KvInsert),
            b"KUPD" => Some(RecordTag::KvUpdate),
            b"KDEL" => Some(RecordTag::KvDelete),
            _ => None,
        }
    }
}

/// A single durable state change
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    /// A new account: name, password digest, initial (usually empty) content
    UserCreated {
        name: String,
        digest: [u8; DIGEST_LEN],
        content: Bytes,
    },

    /// A user's content was replaced
    ContentSet { name: String, data: Bytes },

    /// A key was inserted into the key-value table
    KvInsert { key: String, value: Bytes },

    /// An existing key's value was replaced
    KvUpdate { key: String, value: Bytes },

    /// A key was removed from the key-value table
    KvDelete { key: String },
}

impl LogRecord {
    /// The tag identifying this record variant on disk
    pub fn tag(&self) -> RecordTag {
        match self {
            LogRecord::UserCreated { .. } => RecordTag::UserCreated,
            LogRecord::ContentSet { .. } => RecordTag::ContentSet,
            LogRecord::KvInsert { .. } => RecordTag::KvInsert,
            LogRecord::KvUpdate { .. } => RecordTag::KvUpdate,
            LogRecord::KvDelete { .. } => RecordTag::KvDelete,
        }
    }

    /// Total encoded size in bytes, header included
    pub fn encoded_len(&self) -> usize {
        let payload = match self {
            LogRecord::UserCreated { name, content, .. } => {
                FIELD_PREFIX_SIZE + name.len() + DIGEST_LEN + FIELD_PREFIX_SIZE + content.len()
            }
            LogRecord::ContentSet { name, data } => {
                FIELD_PREFIX_SIZE + name.len() + FIELD_PREFIX_SIZE + data.len()
            }
            LogRecord::KvInsert { key, value } | LogRecord::KvUpdate { key, value } => {
                FIELD_PREFIX_SIZE + key.len() + FIELD_PREFIX_SIZE + value.len()
            }
            LogRecord::KvDelete { key } => FIELD_PREFIX_SIZE + key.len(),
        };
        HEADER_SIZE + payload
    }

    /// Encode to the on-disk representation
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.tag().bytes());
        // payload length patched in after the payload is built
        buf.extend_from_slice(&[0u8; 4]);

        match self {
            LogRecord::UserCreated {
                name,
                digest,
                content,
            } => {
                put_field(&mut buf, name.as_bytes());
                buf.extend_from_slice(digest);
                put_field(&mut buf, content);
            }
            LogRecord::ContentSet { name, data } => {
                put_field(&mut buf, name.as_bytes());
                put_field(&mut buf, data);
            }
            LogRecord::KvInsert { key, value } | LogRecord::KvUpdate { key, value } => {
                put_field(&mut buf, key.as_bytes());
                put_field(&mut buf, value);
            }
            LogRecord::KvDelete { key } => {
                put_field(&mut buf, key.as_bytes());
            }
        }

        let payload_len = (buf.len() - HEADER_SIZE) as u32;
        buf[4..8].copy_from_slice(&payload_len.to_le_bytes());
        buf
    }

    /// Decode a record payload for a known tag
    ///
    /// The payload must contain exactly the fields of the variant; leftover
    /// bytes are a corruption error.
    pub fn decode_payload(tag: RecordTag, payload: &[u8]) -> Result<Self> {
        let mut fields = FieldCursor::new(payload);
        let record = match tag {
            RecordTag::UserCreated => {
                let name = fields.string()?;
                let mut digest = [0u8; DIGEST_LEN];
                digest.copy_from_slice(fields.fixed(DIGEST_LEN)?);
                let content = Bytes::copy_from_slice(fields.bytes()?);
                LogRecord::UserCreated {
                    name,
                    digest,
                    content,
                }
            }
            RecordTag::ContentSet => LogRecord::ContentSet {
                name: fields.string()?,
                data: Bytes::copy_from_slice(fields.bytes()?),
            },
            RecordTag::KvInsert => LogRecord::KvInsert {
                key: fields.string()?,
                value: Bytes::copy_from_slice(fields.bytes()?),
            },
            RecordTag::KvUpdate => LogRecord::KvUpdate {
                key: fields.string()?,
                value: Bytes::copy_from_slice(fields.bytes()?),
            },
            RecordTag::KvDelete => LogRecord::KvDelete {
                key: fields.string()?,
            },
        };
        fields.finish()?;
        Ok(record)
    }
}

/// Append a length-prefixed field
fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// Sequential reader over the fields of one record payload
struct FieldCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Read a length-prefixed field
    fn bytes(&mut self) -> Result<&'a [u8]> {
        let prefix = self.fixed(FIELD_PREFIX_SIZE)?;
        let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        self.fixed(len)
    }

    /// Read a length-prefixed UTF-8 field
    fn string(&mut self) -> Result<String> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| VaultError::LogCorruption("non-UTF-8 name field".to_string()))
    }

    /// Read exactly `len` raw bytes
    fn fixed(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < len {
            return Err(VaultError::LogCorruption(format!(
                "record payload too short: wanted {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.buf.len() - self.pos
            )));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Assert the payload was fully consumed
    fn finish(self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(VaultError::LogCorruption(format!(
                "{} trailing bytes in record payload",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}
