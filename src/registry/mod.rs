//! User Registry Module
//!
//! Authenticated accounts and their profile content.
//!
//! ## Responsibilities
//! - Unique, case-sensitive account names
//! - Fixed-width password digests (never the plaintext)
//! - Per-account opaque content, readable by any authenticated user

mod table;

pub use table::UserTable;

use bytes::Bytes;

/// Width of a stored password digest in bytes
pub const DIGEST_LEN: usize = 16;

/// One registered account
#[derive(Debug, Clone)]
pub struct User {
    /// Unique account name
    pub name: String,

    /// Digest of the account password
    pub digest: [u8; DIGEST_LEN],

    /// Opaque profile content, empty until SET
    pub content: Bytes,
}

/// Compute the fixed-width digest stored for a password
///
/// MD5 is the one widely used unkeyed digest with a 16-byte output, which
/// is the width the on-disk format fixes. Nothing else depends on the
/// algorithm, so swapping it means changing only this function.
pub fn digest(password: &str) -> [u8; DIGEST_LEN] {
    md5::compute(password.as_bytes()).0
}
