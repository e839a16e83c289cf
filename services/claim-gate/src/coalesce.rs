//! In-process suppression of duplicate in-flight claim requests.
//!
//! Purely an ergonomics layer for callers with multiple tabs or impatient
//! retry loops; the state machine alone carries the exactly-once guarantee,
//! and this map is local to the process, time-boxed, and never consulted for
//! correctness.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
struct Entry {
    started: Instant,
    token: u64,
}

pub struct Coalescer {
    window: Duration,
    next_token: AtomicU64,
    inflight: Mutex<HashMap<String, Entry>>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            next_token: AtomicU64::new(0),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.inflight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("coalescer lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Begin a keyed request, or return `None` when one started within the
    /// window is still in flight. Entries older than the window are treated
    /// as leaked (a request that never dropped its guard) and replaced.
    pub fn try_begin(self: Arc<Self>, key: &str) -> Option<InflightGuard> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut inflight = self.lock();
            if let Some(entry) = inflight.get(key) {
                if entry.started.elapsed() < self.window {
                    return None;
                }
            }
            inflight.insert(
                key.to_string(),
                Entry {
                    started: Instant::now(),
                    token,
                },
            );
        }
        Some(InflightGuard {
            key: key.to_string(),
            token,
            coalescer: self,
        })
    }

    #[cfg(test)]
    fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

/// Releases the key when the request finishes, however it finishes.
pub struct InflightGuard {
    coalescer: Arc<Coalescer>,
    key: String,
    token: u64,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut inflight = self.coalescer.lock();
        // Only remove our own entry; a stale guard must not evict a newer
        // request that replaced it.
        if inflight.get(&self.key).map(|entry| entry.token) == Some(self.token) {
            inflight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_in_flight_rejected() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_secs(30)));
        let guard = coalescer.clone().try_begin("alice:42");
        assert!(guard.is_some());
        assert!(coalescer.clone().try_begin("alice:42").is_none());
        // A different key is unaffected.
        assert!(coalescer.clone().try_begin("alice:43").is_some());
    }

    #[test]
    fn test_guard_drop_releases_key() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_secs(30)));
        drop(coalescer.clone().try_begin("alice:42"));
        assert!(coalescer.clone().try_begin("alice:42").is_some());
    }

    #[test]
    fn test_stale_entry_replaced_and_kept() {
        let coalescer = Arc::new(Coalescer::new(Duration::from_millis(0)));
        let first = coalescer.clone().try_begin("alice:42").unwrap();
        // Zero window: the first entry is immediately stale and replaceable.
        let _second = coalescer
            .clone()
            .try_begin("alice:42")
            .expect("stale entry is replaced");
        // Dropping the superseded guard must not evict the replacement.
        drop(first);
        assert!(coalescer.contains("alice:42"));
    }
}
