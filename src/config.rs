//! Configuration for vaultkv
//!
//! Centralized configuration with sensible defaults.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a vaultkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── vault.log        (append-only persistence log)
    ///     └── extensions/      (registered map-reduce artifacts)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Quota Configuration
    // -------------------------------------------------------------------------
    /// Length of the admission window. Zero disables quota enforcement.
    pub quota_window: Duration,

    /// Bytes of stored data a user may upload per window (KVI/KVU payloads)
    pub quota_up: u64,

    /// Bytes a user may download per window (KVG/KVA/KVT response payloads)
    pub quota_down: u64,

    /// Requests of any key-value kind a user may make per window
    pub quota_req: u64,

    // -------------------------------------------------------------------------
    // Key-Value Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of keys returned by a top-keys query
    pub top_len: usize,

    // -------------------------------------------------------------------------
    // Access Configuration
    // -------------------------------------------------------------------------
    /// Usernames allowed to register map-reduce extensions
    pub admins: HashSet<String>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./vaultkv_data"),
            quota_window: Duration::from_secs(60),
            quota_up: 1024 * 1024,
            quota_down: 1024 * 1024,
            quota_req: 1024,
            top_len: 4,
            admins: HashSet::new(),
            listen_addr: "127.0.0.1:9999".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the persistence log file
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("vault.log")
    }

    /// Directory where registered extension artifacts are written
    pub fn extensions_dir(&self) -> PathBuf {
        self.data_dir.join("extensions")
    }

    /// True if the given username may register extensions
    pub fn is_admin(&self, name: &str) -> bool {
        self.admins.contains(name)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the quota window length (zero disables quotas)
    pub fn quota_window(mut self, window: Duration) -> Self {
        self.config.quota_window = window;
        self
    }

    /// Set the per-window upload cap in bytes
    pub fn quota_up(mut self, bytes: u64) -> Self {
        self.config.quota_up = bytes;
        self
    }

    /// Set the per-window download cap in bytes
    pub fn quota_down(mut self, bytes: u64) -> Self {
        self.config.quota_down = bytes;
        self
    }

    /// Set the per-window request cap
    pub fn quota_req(mut self, count: u64) -> Self {
        self.config.quota_req = count;
        self
    }

    /// Set the maximum length of a top-keys listing
    pub fn top_len(mut self, len: usize) -> Self {
        self.config.top_len = len;
        self
    }

    /// Add an admin username
    pub fn admin(mut self, name: impl Into<String>) -> Self {
        self.config.admins.insert(name.into());
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
