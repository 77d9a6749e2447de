//! Error types for vaultkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for vaultkv operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("log corruption detected: {0}")]
    LogCorruption(String),

    #[error("log write failed: {0}")]
    LogWrite(String),

    // -------------------------------------------------------------------------
    // Extension Errors
    // -------------------------------------------------------------------------
    #[error("extension load failed: {0}")]
    ExtensionLoad(String),

    #[error("extension execution failed: {0}")]
    ExtensionPanic(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
