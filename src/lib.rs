//! # vaultkv
//!
//! A persistent, authenticated, multi-user key-value store with:
//! - Append-only persistence log with replay and compaction
//! - Per-user fixed-window admission control (quotas)
//! - Admin-gated map-reduce extensions over the live table
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Store                                  │
//! │     auth → quota admission → append-to-log → apply           │
//! └──────┬──────────┬──────────┬──────────┬─────────────────────┘
//!        │          │          │          │
//!        ▼          ▼          ▼          ▼
//!  ┌──────────┐ ┌────────┐ ┌────────┐ ┌──────────┐
//!  │   Log    │ │Registry│ │KvTable │ │FuncTable │
//!  │ (Append) │ │(RwLock)│ │(RwLock)│ │(RwLock)  │
//!  └──────────┘ └────────┘ └────────┘ └──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod registry;
pub mod kvtable;
pub mod quota;
pub mod mapreduce;
pub mod protocol;
pub mod store;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, VaultError};
pub use config::Config;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of vaultkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
