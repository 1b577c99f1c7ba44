//! Modelo de ServiceOrder
//!
//! El `status` de una orden es siempre función del estado de sus tareas
//! (ver el motor de derivación en services); nunca lo fija el usuario salvo
//! en la creación. `registration_status` indica si el cliente ya es
//! conocido: las órdenes de recepción rápida pueden nacer sin cliente.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado de una orden o tarea de servicio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Completed,
}

/// Estado de registro del cliente en la orden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceOrder {
    pub id: Uuid,
    pub order_number: String,
    /// Nullable: desconocido al momento de la recepción rápida
    pub client_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub registration_status: RegistrationStatus,
    pub assigned_vendor_id: Option<Uuid>,
    pub created_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtros de búsqueda para el listado de órdenes; todos opcionales y
/// combinados con AND
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilters {
    /// Órdenes con al menos una tarea de este técnico
    pub technician_id: Option<Uuid>,
    /// Substring del nombre del cliente (case-insensitive) o id exacto
    pub client: Option<String>,
    pub status: Option<ServiceStatus>,
    /// Substring de la placa (case-insensitive)
    pub plate: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Limpia todos los demás filtros incondicionalmente
    #[serde(default)]
    pub clear: bool,
}

impl OrderFilters {
    /// Filtros efectivos: el flag `clear` descarta todo lo demás
    pub fn effective(self) -> Self {
        if self.clear {
            Self::default()
        } else {
            self
        }
    }

    /// Rango de fechas de creación: inicio inclusivo, fin exclusivo con
    /// `date_to` corrido un día para incluir el fin de día completo
    pub fn created_between(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self
            .date_from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
        let to = self
            .date_to
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc() + Duration::days(1));
        (from, to)
    }
}

/// Request de recepción rápida: la placa es lo único obligatorio. El cliente
/// y los datos del vehículo pueden completarse después.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuickOrderRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,

    /// Cliente conocido al momento de la recepción, si lo hay
    pub client_id: Option<Uuid>,
}

/// Resumen de tarea dentro de una orden enriquecida
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub description: String,
    pub status: ServiceStatus,
    pub technician_id: Uuid,
    pub technician_name: String,
}

/// Orden enriquecida para vistas: cliente, vehículo y técnicos resueltos
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedOrder {
    pub id: Uuid,
    pub order_number: String,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub vehicle_id: Uuid,
    pub vehicle_plate: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
    pub registration_status: RegistrationStatus,
    pub assigned_vendor_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tasks: Vec<TaskSummary>,
}

/// Página de órdenes enriquecidas
#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<EnrichedOrder>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_flag_drops_all_filters() {
        let filters = OrderFilters {
            technician_id: Some(Uuid::new_v4()),
            client: Some("garcia".to_string()),
            status: Some(ServiceStatus::Pending),
            plate: Some("ABC".to_string()),
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 31),
            clear: true,
        };

        let effective = filters.effective();
        assert!(effective.technician_id.is_none());
        assert!(effective.client.is_none());
        assert!(effective.status.is_none());
        assert!(effective.plate.is_none());
        assert!(effective.date_from.is_none());
        assert!(effective.date_to.is_none());
    }

    #[test]
    fn test_date_range_is_inclusive_start_exclusive_bumped_end() {
        let filters = OrderFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 3, 10),
            date_to: NaiveDate::from_ymd_opt(2025, 3, 15),
            ..Default::default()
        };

        let (from, to) = filters.created_between();
        assert_eq!(
            from.unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
        );
        // El fin se corre un día para que el 15 completo quede incluido
        assert_eq!(
            to.unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 16)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
        );
    }

    #[test]
    fn test_open_ended_date_range() {
        let filters = OrderFilters {
            date_from: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..Default::default()
        };

        let (from, to) = filters.created_between();
        assert!(from.is_some());
        assert!(to.is_none());
    }
}
