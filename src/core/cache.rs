use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
    last_accessed: Instant,
}

/// Thread-safe cache with TTL and LRU eviction.
pub struct Cache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    max_size: usize,
    ttl: Duration,
}

impl<K: Eq + std::hash::Hash + Clone, V: Clone> Cache<K, V> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_size,
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.write();

        match entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: K, value: V) {
        let now = Instant::now();

        let entry = CacheEntry {
            value,
            expires_at: now + self.ttl,
            last_accessed: now,
        };

        let mut entries = self.entries.write();
        entries.insert(key, entry);

        self.evict_if_needed(&mut entries);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn evict_if_needed(&self, entries: &mut HashMap<K, CacheEntry<V>>) {
        if entries.len() <= self.max_size {
            return;
        }

        let now = Instant::now();

        // Expired entries go first
        entries.retain(|_, entry| now < entry.expires_at);

        while entries.len() > self.max_size {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone());

            if let Some(key) = lru_key {
                entries.remove(&key);
            } else {
                break;
            }
        }
    }
}

/// A successful response body kept for reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Key-value store the fetcher consults before going to the network.
///
/// Keys are request URLs. Only successful responses are ever stored.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedResponse>;
    fn put(&self, key: &str, value: CachedResponse);
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _key: &str) -> Option<CachedResponse> {
        None
    }

    fn put(&self, _key: &str, _value: CachedResponse) {}
}

/// In-memory response cache with a TTL and a bounded number of entries.
pub struct TtlResponseCache {
    inner: Cache<String, CachedResponse>,
}

impl TtlResponseCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Cache::new(max_size, ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ResponseCache for TtlResponseCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        self.inner.get(&key.to_string())
    }

    fn put(&self, key: &str, value: CachedResponse) {
        self.inner.set(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> CachedResponse {
        CachedResponse {
            body: body.as_bytes().to_vec(),
            content_type: "application/json".to_string(),
        }
    }

    #[test]
    fn test_set_and_get() {
        let cache: Cache<String, String> = Cache::new(100, Duration::from_secs(60));

        cache.set("key".to_string(), "value".to_string());
        let result = cache.get(&"key".to_string());

        assert_eq!(result, Some("value".to_string()));
    }

    #[test]
    fn test_get_nonexistent() {
        let cache: Cache<String, String> = Cache::new(100, Duration::from_secs(60));

        assert!(cache.get(&"nonexistent".to_string()).is_none());
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache: Cache<String, String> = Cache::new(100, Duration::ZERO);
        cache.set("key".to_string(), "value".to_string());

        assert!(cache.get(&"key".to_string()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache: Cache<String, u32> = Cache::new(2, Duration::from_secs(60));
        cache.set("a".to_string(), 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b".to_string(), 2);
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes the oldest
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn test_no_cache_stores_nothing() {
        let cache = NoCache;
        cache.put("https://example.com", response("{}"));
        assert!(cache.get("https://example.com").is_none());
    }

    #[test]
    fn test_ttl_response_cache() {
        let cache = TtlResponseCache::new(10, Duration::from_secs(60));
        cache.put("https://example.com/a", response(r#"{"a":1}"#));

        assert_eq!(cache.get("https://example.com/a"), Some(response(r#"{"a":1}"#)));
        assert!(cache.get("https://example.com/b").is_none());
        assert_eq!(cache.len(), 1);
    }
}
