//! Process-local, advisory, TTL-keyed cache for the metrics query service
//! (§4.G). Lost writes are tolerated; the cache is never authoritative.

use moka::sync::Cache;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: String,
    pub test_id: Option<String>,
    pub execution_id: Option<String>,
    pub from_micros: i64,
    pub to_micros: i64,
    pub interval_secs: i64,
}

pub struct QueryCache {
    inner: Cache<CacheKey, Value>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).max_capacity(10_000).build(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: CacheKey, value: Value) {
        self.inner.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(endpoint: &str) -> CacheKey {
        CacheKey {
            endpoint: endpoint.to_string(),
            test_id: None,
            execution_id: None,
            from_micros: 0,
            to_micros: 1,
            interval_secs: 5,
        }
    }

    #[test]
    fn hits_within_ttl_return_byte_equal_payload() {
        let cache = QueryCache::new(Duration::from_secs(30));
        cache.insert(key("rps"), serde_json::json!([{"time": 1, "rps": 2.0}]));
        assert_eq!(cache.get(&key("rps")), Some(serde_json::json!([{"time": 1, "rps": 2.0}])));
    }

    #[test]
    fn distinct_keys_miss() {
        let cache = QueryCache::new(Duration::from_secs(30));
        cache.insert(key("rps"), serde_json::json!([]));
        assert_eq!(cache.get(&key("vus")), None);
    }
}
