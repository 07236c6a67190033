//! Short-lived cache for LLM completions.
//!
//! Repeated utterances within a dialogue turn hit the same contract with the
//! same text; caching the completion avoids a second remote call. Entries
//! expire after a fixed TTL. Eviction is lazy: every lookup and insert first
//! drops all expired entries, so there is no background sweep.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct CacheEntry {
    response: String,
    stored_at: Instant,
}

/// TTL cache keyed by `(contract identifier, normalized text)`.
pub struct LlmCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl LlmCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key: SHA-256 over the contract id and the normalized text.
    pub fn key(contract_id: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(contract_id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(normalize_text(text).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a cached response. Expired entries are evicted and an expired
    /// hit is reported as a miss.
    pub fn get(&self, contract_id: &str, text: &str) -> Option<String> {
        let key = Self::key(contract_id, text);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        self.evict_expired(&mut entries);
        entries.get(&key).map(|entry| entry.response.clone())
    }

    /// Store a response.
    pub fn put(&self, contract_id: &str, text: &str, response: impl Into<String>) {
        let key = Self::key(contract_id, text);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        self.evict_expired(&mut entries);
        entries.insert(
            key,
            CacheEntry {
                response: response.into(),
                stored_at: Instant::now(),
            },
        );
    }

    fn evict_expired(&self, entries: &mut HashMap<String, CacheEntry>) {
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Lowercase and collapse whitespace so trivially different utterances
/// share an entry.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
