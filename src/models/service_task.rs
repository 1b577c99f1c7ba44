//! Modelo de ServiceTask
//!
//! Tarea de un técnico contra una orden. Cada mutación de tarea dispara la
//! re-derivación del estado de su orden padre.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::service_order::ServiceStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceTask {
    pub id: Uuid,
    pub order_id: Uuid,
    pub technician_id: Uuid,
    pub description: String,
    pub status: ServiceStatus,
    pub observations: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para agregar una tarea a una orden
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTaskRequest {
    pub technician_id: Uuid,

    #[validate(length(min = 1, max = 500))]
    pub description: String,
}

/// Cambios parciales sobre una tarea existente
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub status: Option<ServiceStatus>,
    pub observations: Option<String>,
    pub description: Option<String>,
    pub technician_id: Option<Uuid>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.observations.is_none()
            && self.description.is_none()
            && self.technician_id.is_none()
    }
}

/// Edición masiva de las tareas de una orden: borrar marcadas, actualizar
/// existentes y crear nuevas, en ese orden
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskBulkEdit {
    #[serde(default)]
    pub delete_ids: Vec<Uuid>,
    #[serde(default)]
    pub updates: Vec<TaskUpdate>,
    #[serde(default)]
    pub new_tasks: Vec<NewTaskRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdate {
    pub id: Uuid,
    #[serde(flatten)]
    pub patch: TaskPatch,
}

/// Tarea con contexto de orden y vehículo, para la vista del técnico
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TechnicianTaskView {
    pub id: Uuid,
    pub description: String,
    pub status: ServiceStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub order_id: Uuid,
    pub order_number: String,
    pub vehicle_plate: String,
    pub vehicle_make: Option<String>,
}

/// Conteo de tareas por estado para un técnico
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}
