//! Cache
//!
//! Este módulo contiene los sistemas de cache. Las estadísticas agregadas
//! del dashboard se guardan bajo una clave fija y se invalidan (no se
//! refrescan) después de cada mutación de órdenes o tareas.

pub mod cache_config;
pub mod memory_cache;
pub mod redis_client;

pub use cache_config::CacheConfig;
pub use memory_cache::MemoryCache;
pub use redis_client::RedisClient;

use crate::utils::errors::AppResult;

/// Clave fija de las estadísticas agregadas del dashboard admin
pub const ADMIN_STATS_KEY: &str = "admin_stats";

/// Operaciones de cache
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Leer un valor; un error de cache se degrada a MISS
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>>;

    /// Guardar un valor con TTL en segundos
    async fn set(&self, key: &str, value: serde_json::Value, ttl: u64) -> AppResult<()>;

    /// Eliminar un valor
    async fn invalidate(&self, key: &str) -> AppResult<()>;
}
