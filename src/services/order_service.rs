//! Ciclo de vida de órdenes de servicio
//!
//! La recepción rápida es la operación central del mostrador: con solo la
//! placa se resuelve (o se crea) el vehículo, se acuña un número de orden y
//! la orden nace, con o sin cliente conocido.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::cache::{CacheOperations, ADMIN_STATS_KEY};
use crate::models::service_order::{
    QuickOrderRequest, RegistrationStatus, ServiceOrder, ServiceStatus,
};
use crate::models::user::{Caller, UserRole};
use crate::models::vehicle::{activate_relation, Vehicle};
use crate::repositories::{OrderRepository, UserRepository, VehicleRepository};
use crate::services::audit_service::{
    AuditLogger, ACTION_CREAR_ORDEN, ACTION_ELIMINAR_ORDEN, ACTION_REASIGNAR_VENDEDOR,
};
use crate::services::authorization_service::require_any;
use crate::services::sequence_service::SequenceGenerator;
use crate::utils::errors::{bad_request_error, not_found_error, AppResult};
use crate::utils::validation::validate_plate;

pub struct OrderService {
    orders: OrderRepository,
    vehicles: VehicleRepository,
    users: UserRepository,
    sequence: SequenceGenerator,
    audit: AuditLogger,
    cache: Arc<dyn CacheOperations>,
}

impl OrderService {
    pub fn new(pool: PgPool, audit: AuditLogger, cache: Arc<dyn CacheOperations>) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            sequence: SequenceGenerator::new(pool),
            audit,
            cache,
        }
    }

    /// Recepción rápida de una orden.
    ///
    /// Si la placa no existe se crea el vehículo con los datos que vengan.
    /// El cliente de la orden es el explícito del request o, en su defecto,
    /// el cliente actual del vehículo; sin ninguno de los dos la orden nace
    /// con registro pendiente. Un vendedor que recibe queda asignado a la
    /// orden.
    pub async fn create_quick_order(
        &self,
        caller: &Caller,
        request: QuickOrderRequest,
    ) -> AppResult<ServiceOrder> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
            "create order",
        )?;
        request.validate()?;
        validate_plate(&request.plate)?;

        if let Some(client_id) = request.client_id {
            match self.users.find_by_id(client_id).await? {
                Some(user) if user.role == UserRole::Cliente && user.is_active => {}
                Some(_) => {
                    return Err(bad_request_error("The referenced user is not an active client"))
                }
                None => return Err(not_found_error("Client", &client_id.to_string())),
            }
        }

        let vehicle = match self.vehicles.find_by_plate(&request.plate).await? {
            Some(existing) => existing,
            None => {
                let relations = match request.client_id {
                    Some(client_id) => {
                        activate_relation(&[], client_id, "propietario", Utc::now())
                    }
                    None => Vec::new(),
                };
                self.vehicles
                    .insert(&Vehicle {
                        id: Uuid::new_v4(),
                        plate: request.plate.clone(),
                        make: request.make.clone(),
                        model: request.model.clone(),
                        year: request.year,
                        color: request.color,
                        is_active: true,
                        relations: sqlx::types::Json(relations),
                        created_at: Utc::now(),
                    })
                    .await?
            }
        };

        let client_id = request.client_id.or_else(|| vehicle.active_client_id());
        let registration_status = if client_id.is_some() {
            RegistrationStatus::Completed
        } else {
            RegistrationStatus::Pending
        };

        let now = Utc::now();
        let sequence = self.sequence.next_order_number(now).await?;

        let assigned_vendor_id = if caller.role == UserRole::Vendedor {
            Some(caller.id)
        } else {
            None
        };

        let order = self
            .orders
            .insert(&ServiceOrder {
                id: Uuid::new_v4(),
                order_number: sequence.order_number,
                client_id,
                vehicle_id: vehicle.id,
                description: request.description,
                status: ServiceStatus::Pending,
                registration_status,
                assigned_vendor_id,
                created_by: caller.id,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.audit.log(
            caller,
            ACTION_CREAR_ORDEN,
            &format!("orden {} placa {}", order.order_number, vehicle.plate),
        );
        self.invalidate_stats().await;

        Ok(order)
    }

    /// Baja lógica de la orden: sale de todos los listados y conteos pero
    /// conserva su número y sus tareas
    pub async fn soft_delete(&self, caller: &Caller, order_id: Uuid) -> AppResult<()> {
        require_any(caller, &[UserRole::Administrador], "delete order")?;

        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| not_found_error("Order", &order_id.to_string()))?;

        if !order.is_active {
            return Err(not_found_error("Order", &order_id.to_string()));
        }

        self.orders.set_active(order_id, false).await?;

        self.audit.log(
            caller,
            ACTION_ELIMINAR_ORDEN,
            &format!("orden {}", order.order_number),
        );
        self.invalidate_stats().await;

        Ok(())
    }

    /// Reasigna la orden a otro vendedor activo
    pub async fn reassign_vendor(
        &self,
        caller: &Caller,
        order_id: Uuid,
        vendor_id: Uuid,
    ) -> AppResult<()> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor],
            "reassign vendor",
        )?;

        match self.users.find_by_id(vendor_id).await? {
            Some(user) if user.role == UserRole::Vendedor && user.is_active => {}
            Some(_) => return Err(bad_request_error("The referenced user is not an active vendor")),
            None => return Err(not_found_error("Vendor", &vendor_id.to_string())),
        }

        let affected = self.orders.reassign_vendor(order_id, vendor_id).await?;
        if affected == 0 {
            return Err(not_found_error("Order", &order_id.to_string()));
        }

        self.audit.log(
            caller,
            ACTION_REASIGNAR_VENDEDOR,
            &format!("orden {} vendedor {}", order_id, vendor_id),
        );

        Ok(())
    }

    async fn invalidate_stats(&self) {
        if let Err(err) = self.cache.invalidate(ADMIN_STATS_KEY).await {
            warn!("No se pudo invalidar estadísticas cacheadas: {}", err);
        }
    }
}
