//! The content cache interface the fetcher consults (spec.md §4.2): write
//! through, opaque, and shared across concurrent readers/writers (spec.md
//! §5 "The HTTP content cache is shared and MUST be safe for concurrent
//! reads and writes").

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[async_trait]
pub trait ContentCache: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, body: String);
}

#[derive(Debug)]
struct Entry {
    body: String,
    stored_at: Instant,
}

/// Default in-memory cache: a mutex-guarded map with a per-entry TTL
/// (`max_cache_duration_sec`, default 86400 per spec.md §6).
#[derive(Debug)]
pub struct InMemoryCache {
    max_age: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new(max_cache_duration_sec: u64) -> Self {
        Self { max_age: Duration::from_secs(max_cache_duration_sec), entries: Mutex::new(HashMap::new()) }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(86_400)
    }
}

#[async_trait]
impl ContentCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("InMemoryCache: mutex poisoned");
        entries.get(key).and_then(|entry| {
            if entry.stored_at.elapsed() <= self.max_age {
                Some(entry.body.clone())
            } else {
                None
            }
        })
    }

    async fn set(&self, key: &str, body: String) {
        let mut entries = self.entries.lock().expect("InMemoryCache: mutex poisoned");
        entries.insert(key.to_string(), Entry { body, stored_at: Instant::now() });
    }
}
