//! Persistence Log Module
//!
//! Append-only durability log backing the user registry and key-value table.
//!
//! ## Responsibilities
//! - Append a record for every state change before it applies in memory
//! - Replay all records on startup to rebuild the live tables
//! - Detect and drop a torn trailing record after a crash
//! - Compact the log to one record per live user and per live key
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Record 1                                     │
//! │ ┌─────────┬──────────────┬─────────────────┐ │
//! │ │ Tag (4) │ PayloadLen(4)│ Payload         │ │
//! │ └─────────┴──────────────┴─────────────────┘ │
//! ├──────────────────────────────────────────────┤
//! │ Record 2                                     │
//! │ ┌─────────┬──────────────┬─────────────────┐ │
//! │ │ Tag (4) │ PayloadLen(4)│ Payload         │ │
//! │ └─────────┴──────────────┴─────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Payload fields are `u32 LE length + bytes`, except the fixed 16-byte
//! password digest, which is written raw. The length-prefixed header lets
//! replay resynchronize after any record without fixed offsets.

mod record;
mod writer;
mod reader;
mod replay;

pub use record::{LogRecord, RecordTag, HEADER_SIZE, FIELD_PREFIX_SIZE};
pub use writer::LogWriter;
pub use reader::LogReader;
pub use replay::{LogReplay, ReplayStats};
