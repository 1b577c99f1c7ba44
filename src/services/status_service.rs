//! Motor de derivación del estado de órdenes
//!
//! El estado de una orden es siempre función total del multiconjunto de
//! estados de sus tareas. Cada mutación de tareas termina en una sola
//! re-derivación y, si el estado cambió, en la invalidación de las
//! estadísticas cacheadas.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::cache::{CacheOperations, ADMIN_STATS_KEY};
use crate::models::service_order::ServiceStatus;
use crate::repositories::{OrderRepository, TaskRepository};
use crate::utils::errors::{not_found_error, AppResult};

/// Deriva el estado de una orden a partir de los estados de sus tareas.
///
/// - Sin tareas: pendiente.
/// - Todas completadas: completada.
/// - Alguna en progreso, o alguna completada entre no completadas: en progreso.
/// - En el resto de los casos: pendiente.
pub fn derive_order_status(task_statuses: &[ServiceStatus]) -> ServiceStatus {
    if task_statuses.is_empty() {
        return ServiceStatus::Pending;
    }

    if task_statuses.iter().all(|s| *s == ServiceStatus::Completed) {
        return ServiceStatus::Completed;
    }

    let any_in_progress = task_statuses.iter().any(|s| *s == ServiceStatus::InProgress);
    let any_completed = task_statuses.iter().any(|s| *s == ServiceStatus::Completed);
    if any_in_progress || any_completed {
        ServiceStatus::InProgress
    } else {
        ServiceStatus::Pending
    }
}

pub struct StatusService {
    orders: OrderRepository,
    tasks: TaskRepository,
    cache: Arc<dyn CacheOperations>,
}

impl StatusService {
    pub fn new(pool: PgPool, cache: Arc<dyn CacheOperations>) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
            cache,
        }
    }

    /// Re-deriva y persiste el estado de la orden. Devuelve el par
    /// (anterior, nuevo) cuando hubo cambio.
    pub async fn recompute(
        &self,
        order_id: Uuid,
    ) -> AppResult<Option<(ServiceStatus, ServiceStatus)>> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| not_found_error("Order", &order_id.to_string()))?;

        let statuses = self.tasks.statuses_by_order(order_id).await?;
        let derived = derive_order_status(&statuses);

        if derived == order.status {
            return Ok(None);
        }

        self.orders.update_status(order_id, derived).await?;

        if let Err(err) = self.cache.invalidate(ADMIN_STATS_KEY).await {
            warn!("No se pudo invalidar estadísticas cacheadas: {}", err);
        }

        Ok(Some((order.status, derived)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServiceStatus::{Completed, InProgress, Pending};

    #[test]
    fn test_no_tasks_is_pending() {
        assert_eq!(derive_order_status(&[]), Pending);
    }

    #[test]
    fn test_all_pending_is_pending() {
        assert_eq!(derive_order_status(&[Pending, Pending, Pending]), Pending);
    }

    #[test]
    fn test_all_completed_is_completed() {
        assert_eq!(derive_order_status(&[Completed]), Completed);
        assert_eq!(derive_order_status(&[Completed, Completed]), Completed);
    }

    #[test]
    fn test_any_in_progress_is_in_progress() {
        assert_eq!(derive_order_status(&[Pending, InProgress]), InProgress);
        assert_eq!(derive_order_status(&[InProgress]), InProgress);
        assert_eq!(
            derive_order_status(&[Completed, InProgress, Pending]),
            InProgress
        );
    }

    #[test]
    fn test_partial_completion_counts_as_in_progress() {
        // Trabajo terminado en parte: la orden está avanzando aunque ninguna
        // tarea esté marcada "en progreso" en este instante
        assert_eq!(derive_order_status(&[Completed, Pending]), InProgress);
        assert_eq!(
            derive_order_status(&[Completed, Completed, Pending]),
            InProgress
        );
    }

    #[test]
    fn test_derivation_ignores_order_of_statuses() {
        let a = derive_order_status(&[Pending, Completed, InProgress]);
        let b = derive_order_status(&[InProgress, Pending, Completed]);
        let c = derive_order_status(&[Completed, InProgress, Pending]);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_derivation_is_total_over_all_singletons() {
        assert_eq!(derive_order_status(&[Pending]), Pending);
        assert_eq!(derive_order_status(&[InProgress]), InProgress);
        assert_eq!(derive_order_status(&[Completed]), Completed);
    }
}
