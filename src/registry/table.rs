//! User table implementation
//!
//! BTreeMap-backed account table. Concurrency is the caller's concern: the
//! store wraps this in its read/write lock discipline.

use std::collections::BTreeMap;

use bytes::Bytes;

use super::{digest, User};

/// In-memory table of registered accounts
#[derive(Debug, Default)]
pub struct UserTable {
    users: BTreeMap<String, User>,
}

impl UserTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.users.contains_key(name)
    }

    /// Add an account; fails (without mutation) if the name is taken
    pub fn insert(&mut self, user: User) -> bool {
        if self.users.contains_key(&user.name) {
            return false;
        }
        self.users.insert(user.name.clone(), user);
        true
    }

    /// Check a name/password pair against the stored digest
    pub fn verify(&self, name: &str, password: &str) -> bool {
        match self.users.get(name) {
            Some(user) => user.digest == digest(password),
            None => false,
        }
    }

    /// Replace an account's content; false if the name is unknown
    pub fn set_content(&mut self, name: &str, content: Bytes) -> bool {
        match self.users.get_mut(name) {
            Some(user) => {
                user.content = content;
                true
            }
            None => false,
        }
    }

    /// The content stored for an account, if any
    pub fn content(&self, name: &str) -> Option<Bytes> {
        self.users.get(name).map(|user| user.content.clone())
    }

    /// All registered names, in name order
    pub fn names(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }

    /// Iterate all accounts in name order
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True if no accounts are registered
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
