//! Store Module
//!
//! The core coordinator for all server state.
//!
//! ## Responsibilities
//! - Rebuild live tables from the log on startup
//! - Authenticate and quota-admit every command
//! - Append to the log before applying any mutation in memory
//! - Run compaction and graceful shutdown
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
//!
//! - **Mutations** (register, content-set, KV insert/upsert/delete,
//!   extension registration, compaction): serialized by `write_lock`, then
//!   log append, then the in-memory apply. Because every mutation holds the
//!   same lock across append and apply, log order always matches the order
//!   in which effects become visible.
//! - **Reads** (content-get, lists, KV get, top keys, invocation scans):
//!   concurrent through each table's RwLock, never blocked by each other.
//! - Quota admission uses its own lock and is never held across a table
//!   operation; a map-reduce scan holds only the KV read lock.

use std::fs;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::Result;
use crate::kvtable::KvTable;
use crate::log::{LogRecord, LogReplay, LogWriter};
use crate::mapreduce::{self, FuncTable, MapReduce, SharedObjectLoader};
use crate::protocol::{Command, Credentials, Response, Status};
use crate::quota::QuotaController;
use crate::registry::{self, User, UserTable};

/// The main store
pub struct Store {
    /// Store configuration
    config: Config,

    /// Append-only persistence log (exclusive access needed)
    log: Mutex<LogWriter>,

    /// Registered accounts (internal RwLock)
    users: RwLock<UserTable>,

    /// The shared key-value table (internal RwLock)
    kv: RwLock<KvTable>,

    /// Per-user admission control (internal lock)
    quotas: QuotaController,

    /// Registered map-reduce extensions
    funcs: RwLock<FuncTable>,

    /// Loader for uploaded extension artifacts
    loader: Mutex<SharedObjectLoader>,

    /// Serializes mutations (append-then-apply must not interleave)
    write_lock: Mutex<()>,
}

impl Store {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Replay the log if it exists, else start empty
    /// 3. Open the log for appending
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let log_path = config.log_path();

        let (users, kv) = if log_path.exists() {
            let (users, kv, stats) = LogReplay::run(&log_path)?;
            tracing::info!("loaded: {}", log_path.display());
            tracing::debug!(
                "replay applied {} records ({} bytes)",
                stats.records_applied,
                stats.valid_len
            );
            (users, kv)
        } else {
            tracing::info!("file not found: {}", log_path.display());
            (UserTable::new(), KvTable::new())
        };

        let log = LogWriter::open(&log_path)?;
        let quotas = QuotaController::new(
            config.quota_window,
            config.quota_up,
            config.quota_down,
            config.quota_req,
        );
        let loader = SharedObjectLoader::new(config.extensions_dir());

        Ok(Self {
            config,
            log: Mutex::new(log),
            users: RwLock::new(users),
            kv: RwLock::new(kv),
            quotas,
            funcs: RwLock::new(FuncTable::new()),
            loader: Mutex::new(loader),
            write_lock: Mutex::new(()),
        })
    }

    /// Execute a command
    ///
    /// Every non-fatal failure is recovered here: the response carries the
    /// error status and the session stays usable.
    pub fn execute(&self, command: &Command) -> Response {
        match command {
            Command::Register { creds } => self.register(creds),
            Command::Bye { creds } => self.bye(creds),
            Command::SetContent { creds, content } => self.set_content(creds, content),
            Command::GetContent { creds, target } => self.get_content(creds, target),
            Command::AllUsers { creds } => self.all_users(creds),
            Command::Persist { creds } => self.persist(creds),
            Command::KvInsert { creds, key, value } => self.kv_insert(creds, key, value),
            Command::KvUpsert { creds, key, value } => self.kv_upsert(creds, key, value),
            Command::KvGet { creds, key } => self.kv_get(creds, key),
            Command::KvDelete { creds, key } => self.kv_delete(creds, key),
            Command::KvAll { creds } => self.kv_all(creds),
            Command::KvTop { creds } => self.kv_top(creds),
            Command::FuncRegister {
                creds,
                name,
                object,
            } => self.func_register(creds, name, object),
            Command::FuncInvoke { creds, name } => self.func_invoke(creds, name),
        }
    }

    // =========================================================================
    // User Registry Commands
    // =========================================================================

    /// Create a new account with empty content
    fn register(&self, creds: &Credentials) -> Response {
        let _write = self.write_lock.lock();

        if self.users.read().contains(&creds.username) {
            return Response::status(Status::ErrUserExists);
        }

        let digest = registry::digest(&creds.password);
        let record = LogRecord::UserCreated {
            name: creds.username.clone(),
            digest,
            content: Bytes::new(),
        };
        if let Err(e) = self.log.lock().append(&record) {
            return self.fatal("REG", e);
        }

        self.users.write().insert(User {
            name: creds.username.clone(),
            digest,
            content: Bytes::new(),
        });
        Response::ok()
    }

    /// Authenticate for shutdown; the network layer stops on success
    fn bye(&self, creds: &Credentials) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        Response::ok()
    }

    /// Replace the caller's profile content
    fn set_content(&self, creds: &Credentials, content: &[u8]) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }

        let _write = self.write_lock.lock();
        let data = Bytes::copy_from_slice(content);
        let record = LogRecord::ContentSet {
            name: creds.username.clone(),
            data: data.clone(),
        };
        if let Err(e) = self.log.lock().append(&record) {
            return self.fatal("SET", e);
        }

        self.users.write().set_content(&creds.username, data);
        Response::ok()
    }

    /// Fetch a user's profile content; empty or never-set is an error
    fn get_content(&self, creds: &Credentials, target: &str) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }

        match self.users.read().content(target) {
            Some(content) if !content.is_empty() => Response::ok_with(content.to_vec()),
            _ => Response::status(Status::ErrNoData),
        }
    }

    /// List every registered account name
    fn all_users(&self, creds: &Credentials) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }

        let names = self.users.read().names();
        Response::ok_with(names.join("\n").into_bytes())
    }

    // =========================================================================
    // Key-Value Commands
    // =========================================================================

    /// Insert a new key
    fn kv_insert(&self, creds: &Credentials, key: &str, value: &[u8]) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }
        if !self.quotas.admit_upload(&creds.username, value.len() as u64) {
            return Response::status(Status::ErrQuotaUp);
        }

        let _write = self.write_lock.lock();
        if self.kv.read().contains(key) {
            return Response::status(Status::ErrKey);
        }

        let stored = Bytes::copy_from_slice(value);
        let record = LogRecord::KvInsert {
            key: key.to_string(),
            value: stored.clone(),
        };
        if let Err(e) = self.log.lock().append(&record) {
            return self.fatal("KVI", e);
        }

        self.kv.write().insert(key.to_string(), stored);
        Response::ok()
    }

    /// Insert or update a key, reporting which case occurred
    fn kv_upsert(&self, creds: &Credentials, key: &str, value: &[u8]) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }
        if !self.quotas.admit_upload(&creds.username, value.len() as u64) {
            return Response::status(Status::ErrQuotaUp);
        }

        let _write = self.write_lock.lock();
        let exists = self.kv.read().contains(key);

        let stored = Bytes::copy_from_slice(value);
        let record = if exists {
            LogRecord::KvUpdate {
                key: key.to_string(),
                value: stored.clone(),
            }
        } else {
            LogRecord::KvInsert {
                key: key.to_string(),
                value: stored.clone(),
            }
        };
        if let Err(e) = self.log.lock().append(&record) {
            return self.fatal("KVU", e);
        }

        self.kv.write().upsert(key.to_string(), stored);
        if exists {
            Response::status(Status::OkUpd)
        } else {
            Response::status(Status::OkIns)
        }
    }

    /// Fetch a key's value
    fn kv_get(&self, creds: &Credentials, key: &str) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }

        let value = match self.kv.read().get(key) {
            Some(value) => value,
            None => return Response::status(Status::ErrKey),
        };
        if !self.quotas.admit_download(&creds.username, value.len() as u64) {
            return Response::status(Status::ErrQuotaDown);
        }
        Response::ok_with(value.to_vec())
    }

    /// Remove a key; carries no payload, so only the request counter moves
    fn kv_delete(&self, creds: &Credentials, key: &str) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }

        let _write = self.write_lock.lock();
        if !self.kv.read().contains(key) {
            return Response::status(Status::ErrKey);
        }

        let record = LogRecord::KvDelete {
            key: key.to_string(),
        };
        if let Err(e) = self.log.lock().append(&record) {
            return self.fatal("KVD", e);
        }

        self.kv.write().remove(key);
        Response::ok()
    }

    /// List every live key
    fn kv_all(&self, creds: &Credentials) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }

        let payload = self.kv.read().keys().join("\n").into_bytes();
        if !self.quotas.admit_download(&creds.username, payload.len() as u64) {
            return Response::status(Status::ErrQuotaDown);
        }
        Response::ok_with(payload)
    }

    /// List the most recently touched keys, newest first
    fn kv_top(&self, creds: &Credentials) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        if !self.quotas.admit_request(&creds.username) {
            return Response::status(Status::ErrQuotaReq);
        }

        let payload = self
            .kv
            .read()
            .top(self.config.top_len)
            .join("\n")
            .into_bytes();
        if !self.quotas.admit_download(&creds.username, payload.len() as u64) {
            return Response::status(Status::ErrQuotaDown);
        }
        Response::ok_with(payload)
    }

    // =========================================================================
    // Map-Reduce Commands
    // =========================================================================

    /// Register an extension artifact under a new name (admin only)
    fn func_register(&self, creds: &Credentials, name: &str, object: &[u8]) -> Response {
        if !self.authenticated(creds) || !self.config.is_admin(&creds.username) {
            return Response::status(Status::ErrLogin);
        }

        let _write = self.write_lock.lock();
        if self.funcs.read().contains(name) {
            return Response::status(Status::ErrFunc);
        }

        let ext = match self.loader.lock().load(object) {
            Ok(ext) => ext,
            Err(e) => {
                tracing::warn!("KVF {name}: {e}");
                return Response::status(Status::ErrFunc);
            }
        };

        self.funcs.write().register(name, ext);
        Response::ok()
    }

    /// Install an in-process extension under a name
    ///
    /// Embedders can register extensions implemented in Rust without going
    /// through artifact loading; the admin gate applies only to the network
    /// path. Fails if the name is taken.
    pub fn install_extension(&self, name: &str, ext: Box<dyn MapReduce>) -> bool {
        let _write = self.write_lock.lock();
        self.funcs.write().register(name, ext)
    }

    /// Run a registered extension over the live key-value table
    fn func_invoke(&self, creds: &Credentials, name: &str) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }

        let ext = match self.funcs.read().get(name) {
            Some(ext) => ext,
            None => return Response::status(Status::ErrFunc),
        };

        // Map under the table's read lock; reduce after releasing it.
        let groups = {
            let kv = self.kv.read();
            match mapreduce::map_phase(ext.as_ref(), &kv) {
                Ok(groups) => groups,
                Err(e) => {
                    tracing::warn!("KMR {name}: {e}");
                    return Response::status(Status::ErrServer);
                }
            }
        };

        let mut sink = Vec::new();
        if let Err(e) = mapreduce::reduce_phase(ext.as_ref(), &groups, &mut sink) {
            tracing::warn!("KMR {name}: {e}");
            return Response::status(Status::ErrServer);
        }
        Response::ok_with(sink)
    }

    // =========================================================================
    // Persistence Commands
    // =========================================================================

    /// Compact the log on request
    fn persist(&self, creds: &Credentials) -> Response {
        if !self.authenticated(creds) {
            return Response::status(Status::ErrLogin);
        }
        match self.compact() {
            Ok(size) => {
                tracing::info!("compacted log to {size} bytes");
                Response::ok()
            }
            Err(e) => self.fatal("PERSIST", e),
        }
    }

    /// Rewrite the log to exactly the live state
    ///
    /// One record per live user, then one per live key, history and
    /// tombstones discarded. The resulting size is the sum of the encoded
    /// record sizes, nothing more.
    pub fn compact(&self) -> Result<u64> {
        let _write = self.write_lock.lock();
        let users = self.users.read();
        let kv = self.kv.read();

        let mut records = Vec::with_capacity(users.len() + kv.len());
        for user in users.iter() {
            records.push(LogRecord::UserCreated {
                name: user.name.clone(),
                digest: user.digest,
                content: user.content.clone(),
            });
        }
        for (key, entry) in kv.iter() {
            records.push(LogRecord::KvInsert {
                key: key.clone(),
                value: entry.value.clone(),
            });
        }

        self.log.lock().rewrite(&records)
    }

    /// Flush and sync the log before exit
    pub fn close(&self) -> Result<()> {
        self.log.lock().sync()
    }

    // =========================================================================
    // Helpers and Accessors
    // =========================================================================

    /// Check the credentials against the registry
    fn authenticated(&self, creds: &Credentials) -> bool {
        self.users.read().verify(&creds.username, &creds.password)
    }

    /// Surface a fatal I/O failure to the operator and fail the command
    fn fatal(&self, op: &str, e: crate::VaultError) -> Response {
        tracing::error!("{op} failed: {e}");
        Response::status(Status::ErrServer)
    }

    /// Current log file size in bytes
    pub fn log_size(&self) -> u64 {
        self.log.lock().len()
    }

    /// The store configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
