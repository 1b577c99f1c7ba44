use sqlx::PgPool;
use uuid::Uuid;

use crate::models::service_order::ServiceStatus;
use crate::models::service_task::{ServiceTask, TaskCounts, TaskPatch, TechnicianTaskView};
use crate::utils::errors::{not_found_error, AppResult};

pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, task: &ServiceTask) -> AppResult<ServiceTask> {
        let created = sqlx::query_as::<_, ServiceTask>(
            r#"
            INSERT INTO service_tasks (id, order_id, technician_id, description, status,
                                       observations, start_time, end_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(task.order_id)
        .bind(task.technician_id)
        .bind(&task.description)
        .bind(task.status)
        .bind(&task.observations)
        .bind(task.start_time)
        .bind(task.end_time)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ServiceTask>> {
        let task = sqlx::query_as::<_, ServiceTask>("SELECT * FROM service_tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    /// Parche parcial: los campos ausentes conservan su valor actual
    pub async fn update(&self, id: Uuid, patch: &TaskPatch) -> AppResult<ServiceTask> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Task", &id.to_string()))?;

        let updated = sqlx::query_as::<_, ServiceTask>(
            r#"
            UPDATE service_tasks
            SET status = $2, observations = $3, description = $4, technician_id = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.status.unwrap_or(current.status))
        .bind(patch.observations.clone().unwrap_or(current.observations))
        .bind(patch.description.clone().unwrap_or(current.description))
        .bind(patch.technician_id.unwrap_or(current.technician_id))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Fija los marcadores de inicio/fin según transiciones de estado
    pub async fn set_times(
        &self,
        id: Uuid,
        start: bool,
        end: bool,
        clear_end: bool,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE service_tasks
            SET start_time = CASE WHEN $2 AND start_time IS NULL THEN NOW() ELSE start_time END,
                end_time = CASE WHEN $3 THEN NOW() WHEN $4 THEN NULL ELSE end_time END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(start)
        .bind(end)
        .bind(clear_end)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Borrado duro; las tareas no llevan baja lógica
    pub async fn delete(&self, id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM service_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_by_order(&self, order_id: Uuid) -> AppResult<Vec<ServiceTask>> {
        let tasks = sqlx::query_as::<_, ServiceTask>(
            "SELECT * FROM service_tasks WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Solo los estados, para la re-derivación del estado de la orden
    pub async fn statuses_by_order(&self, order_id: Uuid) -> AppResult<Vec<ServiceStatus>> {
        let statuses: Vec<(ServiceStatus,)> =
            sqlx::query_as("SELECT status FROM service_tasks WHERE order_id = $1")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(statuses.into_iter().map(|(s,)| s).collect())
    }

    /// Tareas de varias órdenes con el nombre del técnico resuelto, para
    /// enriquecer una página completa en una sola consulta
    pub async fn summaries_by_order_ids(
        &self,
        order_ids: &[Uuid],
    ) -> AppResult<Vec<(Uuid, Uuid, String, ServiceStatus, Uuid, Option<String>)>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Uuid, String, ServiceStatus, Uuid, Option<String>)> =
            sqlx::query_as(
                r#"
                SELECT t.order_id, t.id, t.description, t.status, t.technician_id, u.name
                FROM service_tasks t
                LEFT JOIN users u ON u.id = t.technician_id
                WHERE t.order_id = ANY($1)
                ORDER BY t.created_at ASC
                "#,
            )
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Vista del técnico: sus tareas con orden y vehículo resueltos
    pub async fn technician_views(
        &self,
        technician_id: Uuid,
        status: Option<ServiceStatus>,
    ) -> AppResult<Vec<TechnicianTaskView>> {
        let views = sqlx::query_as::<_, TechnicianTaskView>(
            r#"
            SELECT t.id, t.description, t.status, t.start_time, t.end_time,
                   o.id AS order_id, o.order_number, v.plate AS vehicle_plate,
                   v.make AS vehicle_make
            FROM service_tasks t
            JOIN service_orders o ON o.id = t.order_id AND o.is_active = TRUE
            JOIN vehicles v ON v.id = o.vehicle_id
            WHERE t.technician_id = $1
              AND ($2::service_status IS NULL OR t.status = $2)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(technician_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(views)
    }

    /// Conteo de tareas por estado de un técnico (solo órdenes activas)
    pub async fn counts_for_technician(&self, technician_id: Uuid) -> AppResult<TaskCounts> {
        let rows: Vec<(ServiceStatus, i64)> = sqlx::query_as(
            r#"
            SELECT t.status, COUNT(*)
            FROM service_tasks t
            JOIN service_orders o ON o.id = t.order_id AND o.is_active = TRUE
            WHERE t.technician_id = $1
            GROUP BY t.status
            "#,
        )
        .bind(technician_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = TaskCounts::default();
        for (status, count) in rows {
            match status {
                ServiceStatus::Pending => counts.pending = count,
                ServiceStatus::InProgress => counts.in_progress = count,
                ServiceStatus::Completed => counts.completed = count,
            }
        }

        Ok(counts)
    }
}
