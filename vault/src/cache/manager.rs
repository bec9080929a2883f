//! Cache policy: hit/miss decisions and write-back rules.

use super::token_cache::TokenCache;
use crate::models::{
    BatchDetokenizeItem, BatchTokenizeItem, DetokenizeResponse, TokenizeResponse,
};
use std::sync::Arc;
use tracing::debug;

/// Batch input split into cache hits and the remainder to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPartition<T> {
    /// Hits, in the order they were found
    pub cached: Vec<T>,
    /// Misses, in input order
    pub uncached: Vec<String>,
}

impl<T> BatchPartition<T> {
    fn with_capacity(n: usize) -> Self {
        Self { cached: Vec::new(), uncached: Vec::with_capacity(n) }
    }
}

/// Policy layer over [`TokenCache`].
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache: Arc<TokenCache>,
}

impl CacheManager {
    /// Wrap a shared cache.
    #[must_use]
    pub const fn new(cache: Arc<TokenCache>) -> Self {
        Self { cache }
    }

    /// Whether the underlying cache is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Cached tokenize result for `value`.
    #[must_use]
    pub fn get_token_from_cache(&self, value: &str) -> Option<TokenizeResponse> {
        if !self.is_enabled() {
            return None;
        }
        self.cache.get_token(value).map(|entry| TokenizeResponse {
            token: entry.paired,
            exists: true,
            newly_created: false,
            data_type: entry.data_type,
        })
    }

    /// Cached detokenize result for `token`.
    #[must_use]
    pub fn get_value_from_cache(&self, token: &str) -> Option<DetokenizeResponse> {
        if !self.is_enabled() {
            return None;
        }
        self.cache.get_value(token).map(|entry| DetokenizeResponse {
            value: Some(entry.paired),
            exists: true,
            data_type: entry.data_type,
        })
    }

    /// Split `values` into cached tokenize results and values still to fetch.
    #[must_use]
    pub fn get_batch_tokens_from_cache(&self, values: &[String]) -> BatchPartition<BatchTokenizeItem> {
        if !self.is_enabled() {
            return BatchPartition { cached: Vec::new(), uncached: values.to_vec() };
        }

        let mut partition = BatchPartition::with_capacity(values.len());
        for value in values {
            match self.cache.get_token(value) {
                Some(entry) => partition.cached.push(BatchTokenizeItem {
                    original_value: value.clone(),
                    token: Some(entry.paired),
                    exists: true,
                    newly_created: false,
                    data_type: entry.data_type,
                }),
                None => partition.uncached.push(value.clone()),
            }
        }
        debug!(
            hits = partition.cached.len(),
            misses = partition.uncached.len(),
            "Batch tokenize cache lookup"
        );
        partition
    }

    /// Split `tokens` into cached detokenize results and tokens still to fetch.
    #[must_use]
    pub fn get_batch_values_from_cache(&self, tokens: &[String]) -> BatchPartition<BatchDetokenizeItem> {
        if !self.is_enabled() {
            return BatchPartition { cached: Vec::new(), uncached: tokens.to_vec() };
        }

        let mut partition = BatchPartition::with_capacity(tokens.len());
        for token in tokens {
            match self.cache.get_value(token) {
                Some(entry) => partition.cached.push(BatchDetokenizeItem {
                    token: token.clone(),
                    value: Some(entry.paired),
                    exists: true,
                    data_type: entry.data_type,
                }),
                None => partition.uncached.push(token.clone()),
            }
        }
        debug!(
            hits = partition.cached.len(),
            misses = partition.uncached.len(),
            "Batch detokenize cache lookup"
        );
        partition
    }

    /// Store a single tokenize result when it names a real token.
    pub fn store_token_in_cache(&self, value: &str, response: &TokenizeResponse) {
        if self.is_enabled() && (response.exists || response.newly_created) {
            self.cache.put(value, &response.token, response.data_type.as_deref());
        }
    }

    /// Store a single detokenize result when the token resolved.
    pub fn store_value_in_cache(&self, token: &str, response: &DetokenizeResponse) {
        if !self.is_enabled() || !response.exists {
            return;
        }
        if let Some(value) = response.value.as_deref() {
            self.cache.put(value, token, response.data_type.as_deref());
        }
    }

    /// Store batch tokenize items with `exists || newly_created`.
    pub fn store_batch_tokens_in_cache(&self, items: &[BatchTokenizeItem]) {
        if !self.is_enabled() {
            return;
        }
        for item in items.iter().filter(|i| i.exists || i.newly_created) {
            if let Some(token) = item.token.as_deref() {
                self.cache.put(&item.original_value, token, item.data_type.as_deref());
            }
        }
    }

    /// Store batch detokenize items with `exists` and a value.
    pub fn store_batch_values_in_cache(&self, items: &[BatchDetokenizeItem]) {
        if !self.is_enabled() {
            return;
        }
        for item in items.iter().filter(|i| i.exists) {
            if let Some(value) = item.value.as_deref() {
                self.cache.put(value, &item.token, item.data_type.as_deref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> CacheManager {
        CacheManager::new(Arc::new(TokenCache::default()))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn tok_item(value: &str, token: Option<&str>, exists: bool, newly_created: bool) -> BatchTokenizeItem {
        BatchTokenizeItem {
            original_value: value.to_string(),
            token: token.map(str::to_string),
            exists,
            newly_created,
            data_type: Some("string".to_string()),
        }
    }

    #[test]
    fn test_single_hit_reports_existing() {
        let m = manager();
        m.cache().put("4111", "tok_1", Some("card"));

        let hit = m.get_token_from_cache("4111").unwrap();
        assert_eq!(hit.token, "tok_1");
        assert!(hit.exists);
        assert!(!hit.newly_created);
        assert_eq!(hit.data_type.as_deref(), Some("card"));

        let hit = m.get_value_from_cache("tok_1").unwrap();
        assert_eq!(hit.value.as_deref(), Some("4111"));
        assert!(m.get_value_from_cache("tok_2").is_none());
    }

    #[test]
    fn test_batch_partition_preserves_order() {
        let m = manager();
        m.cache().put("c", "tc", None);
        m.cache().put("a", "ta", None);

        let p = m.get_batch_tokens_from_cache(&strings(&["a", "b", "c", "d"]));
        let cached: Vec<_> = p.cached.iter().map(|i| i.original_value.as_str()).collect();
        assert_eq!(cached, ["a", "c"]);
        assert_eq!(p.uncached, strings(&["b", "d"]));
    }

    #[test]
    fn test_batch_values_partition() {
        let m = manager();
        m.cache().put("a", "ta", None);

        let p = m.get_batch_values_from_cache(&strings(&["tx", "ta"]));
        assert_eq!(p.cached.len(), 1);
        assert_eq!(p.cached[0].value.as_deref(), Some("a"));
        assert_eq!(p.uncached, strings(&["tx"]));
    }

    #[test]
    fn test_batch_tokenize_write_back_rule() {
        let m = manager();
        m.store_batch_tokens_in_cache(&[
            tok_item("existing", Some("t1"), true, false),
            tok_item("created", Some("t2"), false, true),
            tok_item("rejected", Some("t3"), false, false),
            tok_item("no-token", None, true, false),
        ]);

        assert!(m.get_token_from_cache("existing").is_some());
        assert!(m.get_token_from_cache("created").is_some());
        assert!(m.get_token_from_cache("rejected").is_none());
        assert!(m.get_token_from_cache("no-token").is_none());
    }

    #[test]
    fn test_batch_detokenize_write_back_rule() {
        let m = manager();
        let item = |token: &str, value: Option<&str>, exists| BatchDetokenizeItem {
            token: token.to_string(),
            value: value.map(str::to_string),
            exists,
            data_type: None,
        };
        m.store_batch_values_in_cache(&[
            item("t1", Some("v1"), true),
            item("t2", None, true),
            item("t3", Some("v3"), false),
        ]);

        assert!(m.get_value_from_cache("t1").is_some());
        assert!(m.get_value_from_cache("t2").is_none());
        assert!(m.get_value_from_cache("t3").is_none());
    }

    #[test]
    fn test_single_write_back_rules() {
        let m = manager();
        let rejected = TokenizeResponse {
            token: "t0".into(),
            exists: false,
            newly_created: false,
            data_type: None,
        };
        m.store_token_in_cache("v0", &rejected);
        assert!(m.get_token_from_cache("v0").is_none());

        let missing = DetokenizeResponse { value: None, exists: false, data_type: None };
        m.store_value_in_cache("t9", &missing);
        assert!(m.cache().is_empty());

        let found = DetokenizeResponse { value: Some("v1".into()), exists: true, data_type: None };
        m.store_value_in_cache("t1", &found);
        assert_eq!(m.get_token_from_cache("v1").unwrap().token, "t1");
    }

    #[test]
    fn test_disabled_short_circuits() {
        let m = CacheManager::new(Arc::new(TokenCache::new(false)));
        m.store_batch_tokens_in_cache(&[tok_item("a", Some("ta"), true, false)]);
        m.store_token_in_cache(
            "b",
            &TokenizeResponse { token: "tb".into(), exists: true, newly_created: false, data_type: None },
        );

        assert!(m.cache().is_empty());
        assert!(m.get_token_from_cache("a").is_none());
        let p = m.get_batch_tokens_from_cache(&strings(&["a", "b"]));
        assert!(p.cached.is_empty());
        assert_eq!(p.uncached, strings(&["a", "b"]));
    }
}
