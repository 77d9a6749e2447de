//! Quota Module
//!
//! Per-user fixed-window admission control for key-value traffic.
//!
//! ## Responsibilities
//! - Track upload bytes, download bytes, and request count per user
//! - Reset all three counters together when the window elapses
//! - Evaluate checks in the fixed order req → up → down
//!
//! Windows are explicit timestamped counters checked at the top of every
//! admitted request; there are no background timers, so admission decisions
//! are deterministic.

mod tracker;

pub use tracker::QuotaTracker;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// The three trackers sharing one window for a single user
#[derive(Debug)]
struct QuotaSet {
    window_start: Instant,
    uploads: QuotaTracker,
    downloads: QuotaTracker,
    requests: QuotaTracker,
}

impl QuotaSet {
    fn new(up: u64, down: u64, req: u64) -> Self {
        Self {
            window_start: Instant::now(),
            uploads: QuotaTracker::new(up),
            downloads: QuotaTracker::new(down),
            requests: QuotaTracker::new(req),
        }
    }

    /// Restart the window if it has elapsed, resetting every counter
    fn roll(&mut self, window: Duration) {
        if self.window_start.elapsed() >= window {
            self.window_start = Instant::now();
            self.uploads.reset();
            self.downloads.reset();
            self.requests.reset();
        }
    }
}

/// Admission controller over all users' quota state
///
/// A zero-length window disables every check. Counters are strictly per
/// user: one user's rejections never affect another's admission.
pub struct QuotaController {
    window: Duration,
    quota_up: u64,
    quota_down: u64,
    quota_req: u64,
    users: Mutex<HashMap<String, QuotaSet>>,
}

impl QuotaController {
    /// Create a controller with the configured window and caps
    pub fn new(window: Duration, quota_up: u64, quota_down: u64, quota_req: u64) -> Self {
        Self {
            window,
            quota_up,
            quota_down,
            quota_req,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request against a user's window
    ///
    /// The request counts even when rejected; returns false once the
    /// incremented count exceeds the cap.
    pub fn admit_request(&self, user: &str) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let mut users = self.users.lock();
        let set = self.entry(&mut users, user);
        set.roll(self.window);
        set.requests.consume(1);
        !set.requests.exceeded()
    }

    /// Admit an upload of `bytes` against a user's window
    ///
    /// A rejected upload consumes nothing.
    pub fn admit_upload(&self, user: &str, bytes: u64) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let mut users = self.users.lock();
        let set = self.entry(&mut users, user);
        set.roll(self.window);
        if set.uploads.would_exceed(bytes) {
            return false;
        }
        set.uploads.consume(bytes);
        true
    }

    /// Admit a download of `bytes` against a user's window
    ///
    /// A rejected download consumes nothing.
    pub fn admit_download(&self, user: &str, bytes: u64) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let mut users = self.users.lock();
        let set = self.entry(&mut users, user);
        set.roll(self.window);
        if set.downloads.would_exceed(bytes) {
            return false;
        }
        set.downloads.consume(bytes);
        true
    }

    fn entry<'a>(
        &self,
        users: &'a mut HashMap<String, QuotaSet>,
        user: &str,
    ) -> &'a mut QuotaSet {
        users
            .entry(user.to_string())
            .or_insert_with(|| QuotaSet::new(self.quota_up, self.quota_down, self.quota_req))
    }
}
