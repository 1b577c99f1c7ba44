use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use tracing::{debug, error, info, warn};

use super::{CacheConfig, CacheOperations};
use crate::utils::errors::{AppError, AppResult};

/// Cliente Redis con connection pooling y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        info!("Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())
            .map_err(|e| AppError::ServiceUnavailable(format!("Redis: {}", e)))?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    pub fn default_ttl(&self) -> u64 {
        self.config.default_ttl
    }

    /// Verificar si Redis está conectado
    pub async fn is_connected(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(_) => false,
        }
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisClient {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let mut conn = self.manager.clone();

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(value)) => {
                debug!("Cache HIT para clave: {}", key);
                let deserialized = serde_json::from_str(&value)
                    .map_err(|e| AppError::Internal(format!("Cache deserialize: {}", e)))?;
                Ok(Some(deserialized))
            }
            Ok(None) => {
                debug!("Cache MISS para clave: {}", key);
                Ok(None)
            }
            Err(e) => {
                // Un cache caído no debe tumbar la lectura; se degrada a MISS
                warn!("Error leyendo cache para clave {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let serialized = value.to_string();
        let result: RedisResult<()> = conn.set_ex(key, serialized, ttl).await;

        match result {
            Ok(()) => {
                debug!("Cache SET para clave: {} (TTL: {}s)", key, ttl);
                Ok(())
            }
            Err(e) => {
                error!("Error guardando en cache para clave {}: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn invalidate(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let result: RedisResult<i64> = conn.del(key).await;

        match result {
            Ok(count) => {
                debug!("Cache DELETE para clave: {} (eliminados: {})", key, count);
                Ok(())
            }
            Err(e) => {
                // La invalidación fallida se registra pero no aborta la mutación
                warn!("Error eliminando cache para clave {}: {}", key, e);
                Ok(())
            }
        }
    }
}
