use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::service_order::{ServiceOrder, ServiceStatus};
use crate::utils::errors::AppResult;

/// Ámbito de visibilidad obligatorio del listado de órdenes, derivado del
/// rol del invocador. Se aplica como predicado en la consulta, nunca como
/// post-filtro sobre datos ya leídos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Vendor(Uuid),
    Client(Uuid),
}

/// Criterios ya resueltos para la búsqueda de órdenes
#[derive(Debug, Clone, Default)]
pub struct OrderSearchCriteria {
    pub scope: Option<OrderScope>,
    pub technician_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub status: Option<ServiceStatus>,
    pub plate: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

fn push_criteria(builder: &mut QueryBuilder<'_, Postgres>, criteria: &OrderSearchCriteria) {
    match criteria.scope {
        Some(OrderScope::Vendor(vendor_id)) => {
            builder.push(" AND assigned_vendor_id = ").push_bind(vendor_id);
        }
        Some(OrderScope::Client(client_id)) => {
            builder.push(" AND client_id = ").push_bind(client_id);
        }
        Some(OrderScope::All) | None => {}
    }

    if let Some(technician_id) = criteria.technician_id {
        builder
            .push(" AND id IN (SELECT order_id FROM service_tasks WHERE technician_id = ")
            .push_bind(technician_id)
            .push(")");
    }

    if let Some(client_id) = criteria.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }

    if let Some(client_name) = &criteria.client_name {
        builder
            .push(" AND client_id IN (SELECT id FROM users WHERE role = 'cliente' AND is_active = TRUE AND name ILIKE ")
            .push_bind(format!("%{}%", client_name))
            .push(")");
    }

    if let Some(status) = criteria.status {
        builder.push(" AND status = ").push_bind(status);
    }

    if let Some(plate) = &criteria.plate {
        builder
            .push(" AND vehicle_id IN (SELECT id FROM vehicles WHERE is_active = TRUE AND plate ILIKE ")
            .push_bind(format!("%{}%", plate))
            .push(")");
    }

    if let Some(from) = criteria.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }

    if let Some(to) = criteria.created_to {
        builder.push(" AND created_at < ").push_bind(to);
    }
}

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, order: &ServiceOrder) -> AppResult<ServiceOrder> {
        let created = sqlx::query_as::<_, ServiceOrder>(
            r#"
            INSERT INTO service_orders (id, order_number, client_id, vehicle_id, description,
                                        status, registration_status, assigned_vendor_id,
                                        created_by, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.client_id)
        .bind(order.vehicle_id)
        .bind(&order.description)
        .bind(order.status)
        .bind(order.registration_status)
        .bind(order.assigned_vendor_id)
        .bind(order.created_by)
        .bind(order.is_active)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ServiceOrder>> {
        let order =
            sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(order)
    }

    /// Reescribe el estado derivado de la orden
    pub async fn update_status(&self, id: Uuid, status: ServiceStatus) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE service_orders SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE service_orders SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Propaga un cliente recién conocido a todas las órdenes huérfanas del
    /// vehículo, en una sola escritura basada en conjunto
    pub async fn backfill_clients(&self, vehicle_id: Uuid, client_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE service_orders
            SET client_id = $2, registration_status = 'completed', updated_at = NOW()
            WHERE vehicle_id = $1 AND client_id IS NULL
            "#,
        )
        .bind(vehicle_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn reassign_vendor(&self, id: Uuid, vendor_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE service_orders SET assigned_vendor_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(vendor_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Página de órdenes activas según criterios, más recientes primero
    pub async fn search(
        &self,
        criteria: &OrderSearchCriteria,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<ServiceOrder>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM service_orders WHERE is_active = TRUE");
        push_criteria(&mut builder, criteria);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(skip);

        let orders = builder
            .build_query_as::<ServiceOrder>()
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Total estimado bajo los mismos criterios del listado
    pub async fn count_search(&self, criteria: &OrderSearchCriteria) -> AppResult<i64> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM service_orders WHERE is_active = TRUE");
        push_criteria(&mut builder, criteria);

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn list_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<ServiceOrder>> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Órdenes abiertas más recientes para el dashboard admin
    pub async fn recent_open(&self, limit: i64) -> AppResult<Vec<ServiceOrder>> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE is_active = TRUE AND status IN ('pending', 'in_progress')
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Órdenes recientes asignadas a un vendedor
    pub async fn recent_by_vendor(
        &self,
        vendor_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<ServiceOrder>> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE is_active = TRUE AND assigned_vendor_id = $1 AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(vendor_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn count_active(&self) -> AppResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM service_orders WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Conteo por estado, opcionalmente acotado a un vendedor
    pub async fn count_by_status(
        &self,
        status: ServiceStatus,
        vendor_id: Option<Uuid>,
    ) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM service_orders
            WHERE is_active = TRUE AND status = $1
              AND ($2::uuid IS NULL OR assigned_vendor_id = $2)
            "#,
        )
        .bind(status)
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn count_by_vendor(&self, vendor_id: Uuid) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM service_orders WHERE is_active = TRUE AND assigned_vendor_id = $1",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Conteo por estado de las órdenes de un cliente
    pub async fn status_counts_for_client(
        &self,
        client_id: Uuid,
    ) -> AppResult<Vec<(ServiceStatus, i64)>> {
        let counts: Vec<(ServiceStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM service_orders
            WHERE is_active = TRUE AND client_id = $1
            GROUP BY status
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
