//! Cache simple en memoria
//!
//! Equivalente en proceso del cache Redis, para entornos sin Redis y para
//! tests. Respeta los mismos contratos de TTL e invalidación.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::CacheOperations;
use crate::utils::errors::AppResult;

#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (serde_json::Value, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheOperations for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: u64) -> AppResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_invalidate() {
        let cache = MemoryCache::new();
        cache
            .set("admin_stats", json!({"total_orders": 3}), 60)
            .await
            .unwrap();

        let hit = cache.get("admin_stats").await.unwrap();
        assert_eq!(hit, Some(json!({"total_orders": 3})));

        cache.invalidate("admin_stats").await.unwrap();
        assert_eq!(cache.get("admin_stats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
