//! Estado compartido de la aplicación
//!
//! Reúne el pool, la configuración y el cache, y construye los servicios.
//! Si Redis no está disponible en el arranque se cae a un cache en memoria;
//! el sistema funciona igual, solo sin cache compartido entre procesos.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::cache::{CacheConfig, CacheOperations, MemoryCache, RedisClient};
use crate::config::EnvironmentConfig;
use crate::services::{
    AuditLogger, DashboardService, OrderQueryService, OrderService, StatusService, TaskService,
    UserService, VehicleService,
};

pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub cache: Arc<dyn CacheOperations>,
    pub users: UserService,
    pub vehicles: VehicleService,
    pub orders: OrderService,
    pub order_queries: OrderQueryService,
    pub tasks: TaskService,
    pub dashboards: DashboardService,
}

impl AppState {
    pub async fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let cache: Arc<dyn CacheOperations> =
            match RedisClient::new(CacheConfig::from_config(&config)).await {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    warn!("Redis no disponible, usando cache en memoria: {}", err);
                    Arc::new(MemoryCache::new())
                }
            };

        Self::with_cache(pool, config, cache)
    }

    pub fn with_cache(
        pool: PgPool,
        config: EnvironmentConfig,
        cache: Arc<dyn CacheOperations>,
    ) -> Self {
        let audit = AuditLogger::new();

        Self {
            users: UserService::new(pool.clone(), audit.clone(), config.page_size),
            vehicles: VehicleService::new(pool.clone(), audit.clone(), config.page_size),
            orders: OrderService::new(pool.clone(), audit.clone(), cache.clone()),
            order_queries: OrderQueryService::new(pool.clone(), config.page_size),
            tasks: TaskService::new(
                pool.clone(),
                audit,
                StatusService::new(pool.clone(), cache.clone()),
            ),
            dashboards: DashboardService::new(pool.clone(), cache.clone(), config.stats_cache_ttl),
            pool,
            config,
            cache,
        }
    }
}
