//! In-memory bidirectional value/token store.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// One direction of a cached mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The other side of the mapping (token for a value, value for a token)
    pub paired: String,
    /// Data type tag reported by the vault
    pub data_type: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    by_value: HashMap<String, CacheEntry>,
    by_token: HashMap<String, CacheEntry>,
}

/// Process-lifetime cache of value/token pairs.
///
/// Both directions live under one lock and are always written together, so
/// a reader never sees a value whose token maps elsewhere. Entries are never
/// evicted; only [`clear`](Self::clear) removes them.
#[derive(Debug)]
pub struct TokenCache {
    inner: Mutex<Inner>,
    enabled: AtomicBool,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether lookups and writes are active.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Turn the cache on or off. Existing entries are kept.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        debug!(enabled, "Token cache toggled");
    }

    /// Record `value <-> token`. No-op while disabled.
    pub fn put(&self, value: &str, token: &str, data_type: Option<&str>) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.inner.lock();

        // Drop counterparts of any previous pairing so the maps stay one-to-one.
        if let Some(old) = inner.by_value.get(value).map(|e| e.paired.clone()) {
            if old != token {
                inner.by_token.remove(&old);
            }
        }
        if let Some(old) = inner.by_token.get(token).map(|e| e.paired.clone()) {
            if old != value {
                inner.by_value.remove(&old);
            }
        }

        let data_type = data_type.map(str::to_string);
        inner.by_value.insert(
            value.to_string(),
            CacheEntry { paired: token.to_string(), data_type: data_type.clone() },
        );
        inner
            .by_token
            .insert(token.to_string(), CacheEntry { paired: value.to_string(), data_type });
    }

    /// Token cached for `value`.
    pub fn get_token(&self, value: &str) -> Option<CacheEntry> {
        if !self.is_enabled() {
            return None;
        }
        self.inner.lock().by_value.get(value).cloned()
    }

    /// Value cached for `token`.
    pub fn get_value(&self, token: &str) -> Option<CacheEntry> {
        if !self.is_enabled() {
            return None;
        }
        self.inner.lock().by_token.get(token).cloned()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let pairs = inner.by_value.len();
        inner.by_value.clear();
        inner.by_token.clear();
        debug!(pairs, "Token cache cleared");
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.inner.lock().by_value.len()
    }

    /// Whether no pairs are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_writes_both_directions() {
        let cache = TokenCache::default();
        cache.put("4111", "tok_1", Some("string"));

        let by_value = cache.get_token("4111").unwrap();
        assert_eq!(by_value.paired, "tok_1");
        assert_eq!(by_value.data_type.as_deref(), Some("string"));
        assert_eq!(cache.get_value("tok_1").unwrap().paired, "4111");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retokenization_overwrites_and_drops_stale_token() {
        let cache = TokenCache::default();
        cache.put("4111", "tok_1", None);
        cache.put("4111", "tok_2", None);

        assert_eq!(cache.get_token("4111").unwrap().paired, "tok_2");
        assert!(cache.get_value("tok_1").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_token_reassigned_drops_stale_value() {
        let cache = TokenCache::default();
        cache.put("a", "tok", None);
        cache.put("b", "tok", None);

        assert_eq!(cache.get_value("tok").unwrap().paired, "b");
        assert!(cache.get_token("a").is_none());
    }

    #[test]
    fn test_disabled_cache_is_transparent() {
        let cache = TokenCache::new(false);
        cache.put("4111", "tok_1", None);
        assert!(cache.get_token("4111").is_none());
        assert!(cache.is_empty());

        cache.set_enabled(true);
        assert!(cache.get_token("4111").is_none());
    }

    #[test]
    fn test_disabling_hides_existing_entries() {
        let cache = TokenCache::default();
        cache.put("4111", "tok_1", None);
        cache.set_enabled(false);
        assert!(cache.get_value("tok_1").is_none());

        cache.set_enabled(true);
        assert!(cache.get_value("tok_1").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = TokenCache::default();
        cache.put("a", "ta", None);
        cache.put("b", "tb", None);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get_value("ta").is_none());
    }

    #[test]
    fn test_concurrent_puts_keep_pairs_consistent() {
        let cache = Arc::new(TokenCache::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(&format!("v{}", i % 50), &format!("t{t}-{i}"), None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for i in 0..50 {
            let value = format!("v{i}");
            let token = cache.get_token(&value).unwrap().paired;
            assert_eq!(cache.get_value(&token).unwrap().paired, value);
        }
        assert_eq!(cache.len(), 50);
    }
}
