// src/cache.rs
// Opportunistic get-or-compute cache for route responses. Losing an entry
// only costs an upstream round trip, so eviction is a plain TTL check at
// lookup time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

struct Entry {
    stored_at: Instant,
    value: serde_json::Value,
}

pub struct FeedCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value under `key`, or run `compute`, store its
    /// result, and return it. A compute error is never cached.
    pub async fn try_get<T, F, Fut>(&self, key: &str, compute: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(hit) = self.lookup(key) {
            if let Ok(value) = serde_json::from_value(hit) {
                return Ok(value);
            }
            // A shape change since the entry was stored; fall through.
        }

        let fresh = compute().await?;
        self.store(key, &fresh);
        Ok(fresh)
    }

    fn lookup(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            let mut entries = self.entries.lock().expect("cache mutex poisoned");
            entries.insert(
                key.to_string(),
                Entry {
                    stored_at: Instant::now(),
                    value: json,
                },
            );
        }
    }
}
