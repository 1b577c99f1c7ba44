//! Estadísticas de dashboards por rol
//!
//! Solo las estadísticas del administrador se cachean (son las únicas que
//! agregan todo el sistema). El cache se lee de forma tolerante: cualquier
//! fallo se trata como MISS y se recalcula contra el store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{CacheOperations, ADMIN_STATS_KEY};
use crate::models::service_order::{ServiceOrder, ServiceStatus};
use crate::models::service_task::TaskCounts;
use crate::models::user::{Caller, UserRole};
use crate::repositories::{
    OrderRepository, TaskRepository, UserRepository, VehicleRepository,
};
use crate::services::authorization_service::require_any;
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusBreakdown {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

/// Estadísticas agregadas para el dashboard del administrador
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_orders: i64,
    pub orders_by_status: OrderStatusBreakdown,
    pub total_users: i64,
    pub users_by_role: Vec<(UserRole, i64)>,
    pub total_vehicles: i64,
    pub recent_orders: Vec<ServiceOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorStats {
    pub assigned_orders: i64,
    pub orders_by_status: OrderStatusBreakdown,
    pub registered_clients: i64,
    pub recent_orders: Vec<ServiceOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianStats {
    pub tasks: TaskCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub orders_by_status: OrderStatusBreakdown,
    pub total_orders: i64,
}

pub struct DashboardService {
    orders: OrderRepository,
    users: UserRepository,
    vehicles: VehicleRepository,
    tasks: TaskRepository,
    cache: Arc<dyn CacheOperations>,
    stats_ttl: u64,
}

impl DashboardService {
    pub fn new(pool: PgPool, cache: Arc<dyn CacheOperations>, stats_ttl: u64) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
            cache,
            stats_ttl,
        }
    }

    /// Estadísticas globales, cacheadas bajo clave fija con TTL
    pub async fn admin_stats(&self, caller: &Caller) -> AppResult<AdminStats> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor],
            "view admin stats",
        )?;

        if let Ok(Some(cached)) = self.cache.get(ADMIN_STATS_KEY).await {
            if let Ok(stats) = serde_json::from_value::<AdminStats>(cached) {
                return Ok(stats);
            }
        }

        let stats = AdminStats {
            total_orders: self.orders.count_active().await?,
            orders_by_status: self.status_breakdown(None).await?,
            total_users: self.users.count_active().await?,
            users_by_role: self.users.role_counts().await?,
            total_vehicles: self.vehicles.count_active().await?,
            recent_orders: self.orders.recent_open(5).await?,
        };

        match serde_json::to_value(&stats) {
            Ok(value) => {
                if let Err(err) = self.cache.set(ADMIN_STATS_KEY, value, self.stats_ttl).await {
                    warn!("No se pudieron cachear estadísticas: {}", err);
                }
            }
            Err(err) => warn!("No se pudieron serializar estadísticas: {}", err),
        }

        Ok(stats)
    }

    pub async fn vendor_stats(&self, caller: &Caller) -> AppResult<VendorStats> {
        require_any(caller, &[UserRole::Vendedor], "view vendor stats")?;

        let since = Utc::now() - Duration::days(30);

        Ok(VendorStats {
            assigned_orders: self.orders.count_by_vendor(caller.id).await?,
            orders_by_status: self.status_breakdown(Some(caller.id)).await?,
            registered_clients: self.users.count_clients_created_by(caller.id).await?,
            recent_orders: self.orders.recent_by_vendor(caller.id, since, 5).await?,
        })
    }

    pub async fn technician_stats(&self, caller: &Caller) -> AppResult<TechnicianStats> {
        require_any(caller, &[UserRole::Tecnico], "view technician stats")?;

        Ok(TechnicianStats {
            tasks: self.tasks.counts_for_technician(caller.id).await?,
        })
    }

    pub async fn client_stats(&self, caller: &Caller) -> AppResult<ClientStats> {
        require_any(caller, &[UserRole::Cliente], "view client stats")?;

        let counts = self.orders.status_counts_for_client(caller.id).await?;
        let mut breakdown = OrderStatusBreakdown {
            pending: 0,
            in_progress: 0,
            completed: 0,
        };
        for (status, count) in &counts {
            match status {
                ServiceStatus::Pending => breakdown.pending = *count,
                ServiceStatus::InProgress => breakdown.in_progress = *count,
                ServiceStatus::Completed => breakdown.completed = *count,
            }
        }

        Ok(ClientStats {
            total_orders: counts.iter().map(|(_, c)| c).sum(),
            orders_by_status: breakdown,
        })
    }

    async fn status_breakdown(&self, vendor_id: Option<Uuid>) -> AppResult<OrderStatusBreakdown> {
        Ok(OrderStatusBreakdown {
            pending: self
                .orders
                .count_by_status(ServiceStatus::Pending, vendor_id)
                .await?,
            in_progress: self
                .orders
                .count_by_status(ServiceStatus::InProgress, vendor_id)
                .await?,
            completed: self
                .orders
                .count_by_status(ServiceStatus::Completed, vendor_id)
                .await?,
        })
    }
}
