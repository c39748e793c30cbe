use std::collections::HashMap;
use std::time::Duration;

use orator_engine::EngineKind;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Identity of a request for duplicate suppression: engine plus text digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn new(engine: EngineKind, text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(format!("{engine}:{digest:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a dedupe lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Accepted,
    Duplicate { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    recorded_at: Instant,
    window: Duration,
}

impl Entry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let age = now.saturating_duration_since(self.recorded_at);
        (age < self.window).then(|| self.window - age)
    }
}

/// Recently dispatched requests, each remembered for its own window
#[derive(Debug, Default)]
pub struct DedupTable {
    entries: HashMap<DedupKey, Entry>,
}

impl DedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` without recording it
    ///
    /// Expired entries are evicted first. A zero window never matches.
    pub fn check(&mut self, key: &DedupKey, window: Duration, now: Instant) -> DedupDecision {
        self.evict(now);

        if window.is_zero() {
            return DedupDecision::Accepted;
        }

        match self.entries.get(key).and_then(|entry| entry.remaining(now)) {
            Some(retry_after) => DedupDecision::Duplicate { retry_after },
            None => DedupDecision::Accepted,
        }
    }

    /// Remember `key` as dispatched at `now`; a zero window records nothing
    pub fn record(&mut self, key: DedupKey, window: Duration, now: Instant) {
        if window.is_zero() {
            return;
        }
        self.entries.insert(key, Entry { recorded_at: now, window });
    }

    /// Check `key` and record it when accepted
    #[cfg(test)]
    fn check_and_record(&mut self, key: DedupKey, window: Duration, now: Instant) -> DedupDecision {
        let decision = self.check(&key, window, now);
        if decision == DedupDecision::Accepted {
            self.record(key, window, now);
        }
        decision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.remaining(now).is_some());
    }
}
