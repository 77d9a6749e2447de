//! Tests for the store
//!
//! These tests verify:
//! - Registration, authentication, and content commands
//! - Key-value command semantics (insert, upsert, get, delete, lists)
//! - Top-key ranking
//! - Persisted file sizes after incremental appends
//! - Compaction size and idempotence
//! - Crash recovery from the log

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use vaultkv::log::{FIELD_PREFIX_SIZE, HEADER_SIZE};
use vaultkv::protocol::{Command, Credentials, Status};
use vaultkv::{Config, Store};

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(data_dir: &Path) -> Config {
    Config::builder()
        .data_dir(data_dir)
        .quota_window(Duration::ZERO) // quotas exercised in quota_tests
        .top_len(2)
        .build()
}

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(test_config(temp_dir.path())).unwrap();
    (temp_dir, store)
}

fn alice() -> Credentials {
    Credentials::new("alice", "alice_is_awesome")
}

fn bob() -> Credentials {
    Credentials::new("bob", "bob_is_awesome")
}

fn register(store: &Store, creds: &Credentials) -> Status {
    store
        .execute(&Command::Register {
            creds: creds.clone(),
        })
        .status
}

fn kv_insert(store: &Store, creds: &Credentials, key: &str, value: &[u8]) -> Status {
    store
        .execute(&Command::KvInsert {
            creds: creds.clone(),
            key: key.to_string(),
            value: value.to_vec(),
        })
        .status
}

fn kv_upsert(store: &Store, creds: &Credentials, key: &str, value: &[u8]) -> Status {
    store
        .execute(&Command::KvUpsert {
            creds: creds.clone(),
            key: key.to_string(),
            value: value.to_vec(),
        })
        .status
}

fn kv_get(store: &Store, creds: &Credentials, key: &str) -> (Status, Option<Vec<u8>>) {
    let response = store.execute(&Command::KvGet {
        creds: creds.clone(),
        key: key.to_string(),
    });
    (response.status, response.payload)
}

fn list_payload(store: &Store, command: Command) -> Vec<String> {
    let response = store.execute(&command);
    assert_eq!(response.status, Status::Ok);
    let payload = response.payload.unwrap_or_default();
    if payload.is_empty() {
        return Vec::new();
    }
    String::from_utf8(payload)
        .unwrap()
        .split('\n')
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Registration and Authentication Tests
// =============================================================================

#[test]
fn test_register_then_duplicate_fails_without_log_growth() {
    let (_temp, store) = setup_temp_store();

    assert_eq!(register(&store, &alice()), Status::Ok);
    let size_after_first = store.log_size();

    assert_eq!(register(&store, &alice()), Status::ErrUserExists);
    assert_eq!(store.log_size(), size_after_first);
}

#[test]
fn test_register_record_size() {
    let (temp, store) = setup_temp_store();

    assert_eq!(register(&store, &alice()), Status::Ok);

    // header + name field + raw digest + empty content field
    let expected = (HEADER_SIZE + FIELD_PREFIX_SIZE + "alice".len() + 16 + FIELD_PREFIX_SIZE) as u64;
    assert_eq!(store.log_size(), expected);
    let log_path = temp.path().join("vault.log");
    assert_eq!(std::fs::metadata(log_path).unwrap().len(), expected);
}

#[test]
fn test_wrong_password_is_rejected() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let fake = Credentials::new("alice", "not_alice_password");
    let response = store.execute(&Command::AllUsers { creds: fake });
    assert_eq!(response.status, Status::ErrLogin);
}

#[test]
fn test_unknown_user_is_rejected() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let response = store.execute(&Command::AllUsers { creds: bob() });
    assert_eq!(response.status, Status::ErrLogin);
}

#[test]
fn test_bye_authenticates() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let ok = store.execute(&Command::Bye { creds: alice() });
    assert_eq!(ok.status, Status::Ok);

    let bad = store.execute(&Command::Bye {
        creds: Credentials::new("alice", "wrong"),
    });
    assert_eq!(bad.status, Status::ErrLogin);
}

// =============================================================================
// Content Tests
// =============================================================================

#[test]
fn test_set_and_get_content() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let set = store.execute(&Command::SetContent {
        creds: alice(),
        content: b"alice's profile".to_vec(),
    });
    assert_eq!(set.status, Status::Ok);

    let get = store.execute(&Command::GetContent {
        creds: alice(),
        target: "alice".to_string(),
    });
    assert_eq!(get.status, Status::Ok);
    assert_eq!(get.payload.unwrap(), b"alice's profile");
}

#[test]
fn test_content_set_grows_log_by_record_size() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());
    let before = store.log_size();

    store.execute(&Command::SetContent {
        creds: alice(),
        content: b"0123456789".to_vec(),
    });
    let expected =
        before + (HEADER_SIZE + FIELD_PREFIX_SIZE + "alice".len() + FIELD_PREFIX_SIZE + 10) as u64;
    assert_eq!(store.log_size(), expected);
}

#[test]
fn test_any_user_reads_any_content() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());
    register(&store, &bob());

    store.execute(&Command::SetContent {
        creds: alice(),
        content: b"shared".to_vec(),
    });

    let get = store.execute(&Command::GetContent {
        creds: bob(),
        target: "alice".to_string(),
    });
    assert_eq!(get.status, Status::Ok);
    assert_eq!(get.payload.unwrap(), b"shared");
}

#[test]
fn test_unset_content_is_no_data() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());
    register(&store, &bob());

    let unset = store.execute(&Command::GetContent {
        creds: alice(),
        target: "bob".to_string(),
    });
    assert_eq!(unset.status, Status::ErrNoData);

    let unknown = store.execute(&Command::GetContent {
        creds: alice(),
        target: "nobody".to_string(),
    });
    assert_eq!(unknown.status, Status::ErrNoData);
}

#[test]
fn test_all_users_lists_every_name() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());
    register(&store, &bob());

    let mut names = list_payload(&store, Command::AllUsers { creds: alice() });
    names.sort();
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
}

// =============================================================================
// Key-Value Tests
// =============================================================================

#[test]
fn test_insert_get_round_trip() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let value = b"\x00binary\xffvalue".to_vec();
    assert_eq!(kv_insert(&store, &alice(), "k1", &value), Status::Ok);

    let (status, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(status, Status::Ok);
    assert_eq!(payload.unwrap(), value);
}

#[test]
fn test_insert_existing_key_fails() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    assert_eq!(kv_insert(&store, &alice(), "k1", b"v1"), Status::Ok);
    let before = store.log_size();
    assert_eq!(kv_insert(&store, &alice(), "k1", b"v2"), Status::ErrKey);
    assert_eq!(store.log_size(), before);

    let (_, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(payload.unwrap(), b"v1");
}

#[test]
fn test_upsert_reports_insert_then_update() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    assert_eq!(kv_upsert(&store, &alice(), "k1", b"v1"), Status::OkIns);
    assert_eq!(kv_upsert(&store, &alice(), "k1", b"v2"), Status::OkUpd);
    assert_eq!(kv_upsert(&store, &alice(), "k1", b"v3"), Status::OkUpd);

    let (_, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(payload.unwrap(), b"v3");
}

#[test]
fn test_delete_removes_key() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    kv_insert(&store, &alice(), "k1", b"v1");
    let delete = store.execute(&Command::KvDelete {
        creds: alice(),
        key: "k1".to_string(),
    });
    assert_eq!(delete.status, Status::Ok);

    let (status, _) = kv_get(&store, &alice(), "k1");
    assert_eq!(status, Status::ErrKey);

    let again = store.execute(&Command::KvDelete {
        creds: alice(),
        key: "k1".to_string(),
    });
    assert_eq!(again.status, Status::ErrKey);
}

#[test]
fn test_get_missing_key_fails() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    let (status, _) = kv_get(&store, &alice(), "never");
    assert_eq!(status, Status::ErrKey);
}

#[test]
fn test_kv_all_lists_live_keys() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    kv_insert(&store, &alice(), "k1", b"v");
    kv_insert(&store, &alice(), "k2", b"v");
    kv_insert(&store, &alice(), "k3", b"v");
    store.execute(&Command::KvDelete {
        creds: alice(),
        key: "k2".to_string(),
    });

    let mut keys = list_payload(&store, Command::KvAll { creds: alice() });
    keys.sort();
    assert_eq!(keys, vec!["k1".to_string(), "k3".to_string()]);
}

// =============================================================================
// Top-Key Tests
// =============================================================================

#[test]
fn test_top_keys_rank_most_recent_first() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    kv_insert(&store, &alice(), "k1", b"v");
    kv_insert(&store, &alice(), "k2", b"v");
    kv_insert(&store, &alice(), "k3", b"v");
    kv_upsert(&store, &alice(), "k1", b"v"); // touch k1 again

    // top_len is 2 in the test config
    let top = list_payload(&store, Command::KvTop { creds: alice() });
    assert_eq!(top, vec!["k1".to_string(), "k3".to_string()]);
}

#[test]
fn test_top_keys_excludes_deleted_and_is_read_only() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    kv_insert(&store, &alice(), "k1", b"v");
    kv_insert(&store, &alice(), "k2", b"v");
    kv_insert(&store, &alice(), "k3", b"v");
    store.execute(&Command::KvDelete {
        creds: alice(),
        key: "k3".to_string(),
    });

    let top = list_payload(&store, Command::KvTop { creds: alice() });
    assert_eq!(top, vec!["k2".to_string(), "k1".to_string()]);

    // Reading the ranking must not change it
    let again = list_payload(&store, Command::KvTop { creds: alice() });
    assert_eq!(again, top);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compaction_size_is_sum_of_live_records() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());

    kv_insert(&store, &alice(), "k1", b"v1");
    kv_upsert(&store, &alice(), "k1", b"longer value");
    kv_insert(&store, &alice(), "k2", b"v2");
    store.execute(&Command::KvDelete {
        creds: alice(),
        key: "k2".to_string(),
    });
    store.execute(&Command::SetContent {
        creds: alice(),
        content: b"profile".to_vec(),
    });

    let persist = store.execute(&Command::Persist { creds: alice() });
    assert_eq!(persist.status, Status::Ok);

    // one user record (7-byte content) + one key record (12-byte value)
    let user_record = HEADER_SIZE + FIELD_PREFIX_SIZE + 5 + 16 + FIELD_PREFIX_SIZE + 7;
    let key_record = HEADER_SIZE + FIELD_PREFIX_SIZE + 2 + FIELD_PREFIX_SIZE + 12;
    assert_eq!(store.log_size(), (user_record + key_record) as u64);
}

#[test]
fn test_compaction_is_idempotent() {
    let (_temp, store) = setup_temp_store();
    register(&store, &alice());
    register(&store, &bob());
    kv_insert(&store, &alice(), "k1", b"v1");
    kv_upsert(&store, &alice(), "k2", b"v2");

    let first = store.compact().unwrap();
    let second = store.compact().unwrap();
    assert_eq!(first, second);

    let mut keys = list_payload(&store, Command::KvAll { creds: alice() });
    keys.sort();
    assert_eq!(keys, vec!["k1".to_string(), "k2".to_string()]);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_restart_recovers_state() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open(test_config(temp_dir.path())).unwrap();
        register(&store, &alice());
        store.execute(&Command::SetContent {
            creds: alice(),
            content: b"persisted profile".to_vec(),
        });
        kv_insert(&store, &alice(), "k1", b"v1");
        kv_upsert(&store, &alice(), "k1", b"v2");
        kv_insert(&store, &alice(), "k2", b"v2");
        store.execute(&Command::KvDelete {
            creds: alice(),
            key: "k2".to_string(),
        });
        store.close().unwrap();
    }

    let store = Store::open(test_config(temp_dir.path())).unwrap();

    assert_eq!(register(&store, &alice()), Status::ErrUserExists);

    let get = store.execute(&Command::GetContent {
        creds: alice(),
        target: "alice".to_string(),
    });
    assert_eq!(get.payload.unwrap(), b"persisted profile");

    let (status, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(status, Status::Ok);
    assert_eq!(payload.unwrap(), b"v2");

    let (status, _) = kv_get(&store, &alice(), "k2");
    assert_eq!(status, Status::ErrKey);
}

#[test]
fn test_restart_after_compaction_recovers_state() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = Store::open(test_config(temp_dir.path())).unwrap();
        register(&store, &alice());
        kv_insert(&store, &alice(), "k1", b"v1");
        store.execute(&Command::Persist { creds: alice() });
        store.close().unwrap();
    }

    let store = Store::open(test_config(temp_dir.path())).unwrap();
    let (status, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(status, Status::Ok);
    assert_eq!(payload.unwrap(), b"v1");
}

#[test]
fn test_restart_ignores_torn_tail() {
    use std::io::Write;

    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("vault.log");

    {
        let store = Store::open(test_config(temp_dir.path())).unwrap();
        register(&store, &alice());
        kv_insert(&store, &alice(), "k1", b"v1");
        store.close().unwrap();
    }
    let intact_len = std::fs::metadata(&log_path).unwrap().len();

    // Simulate a crash mid-append
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap();
    file.write_all(b"KINS\x40\x00").unwrap();
    drop(file);

    let store = Store::open(test_config(temp_dir.path())).unwrap();
    let (status, payload) = kv_get(&store, &alice(), "k1");
    assert_eq!(status, Status::Ok);
    assert_eq!(payload.unwrap(), b"v1");
    assert_eq!(std::fs::metadata(&log_path).unwrap().len(), intact_len);
}
