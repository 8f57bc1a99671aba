//! Per-key interaction rate limiting
//!
//! Absorbs accidental rapid taps: an intent is accepted only if at least one
//! window has elapsed since the last *accepted* intent for the same key.
//! Rejections never touch state, so a stream of taps spaced closer than the
//! window is accepted at most once per window.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Leading-edge debouncer keyed by `K`
#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    window: Duration,
    last_accepted: HashMap<K, Instant>,
}

impl<K: Eq + Hash> Debouncer<K> {
    /// Create a debouncer with the given window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    /// Decide whether an intent for `key` arriving at `now` is accepted
    ///
    /// A key that has never been accepted is always accepted. On acceptance
    /// `now` becomes the key's last-accepted time; on rejection nothing changes.
    pub fn should_accept(&mut self, key: K, now: Instant) -> bool {
        if let Some(last) = self.last_accepted.get(&key) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }

        self.last_accepted.insert(key, now);
        true
    }

    /// Debounce window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Forget every recorded acceptance
    pub fn clear(&mut self) {
        self.last_accepted.clear();
    }
}
