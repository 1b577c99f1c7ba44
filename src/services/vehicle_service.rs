//! Gestión de vehículos y de la relación cliente↔vehículo
//!
//! Activar una relación es la única forma de cambiar el "cliente actual" de
//! un vehículo, y arrastra consigo el backfill: toda orden del vehículo que
//! haya nacido sin cliente queda completada con el cliente recién conocido.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::{Caller, UserRole};
use crate::models::vehicle::{
    activate_relation, ClientRelation, CreateVehicleRequest, UpdateVehicleRequest, Vehicle,
    VehicleListItem,
};
use crate::repositories::{OrderRepository, UserRepository, VehicleRepository};
use crate::services::audit_service::{
    AuditLogger, ACTION_ACTUALIZAR_VEHICULO, ACTION_CREAR_VEHICULO,
};
use crate::services::authorization_service::require_any;
use crate::utils::errors::{bad_request_error, conflict_error, not_found_error, AppResult};
use crate::utils::validation::validate_plate;

const DEFAULT_RELATION_TYPE: &str = "propietario";

pub struct VehicleService {
    vehicles: VehicleRepository,
    orders: OrderRepository,
    users: UserRepository,
    audit: AuditLogger,
    page_size: i64,
}

impl VehicleService {
    pub fn new(pool: PgPool, audit: AuditLogger, page_size: i64) -> Self {
        Self {
            vehicles: VehicleRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            audit,
            page_size,
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        request: CreateVehicleRequest,
    ) -> AppResult<Vehicle> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
            "create vehicle",
        )?;
        request.validate()?;
        validate_plate(&request.plate)?;

        if self.vehicles.find_by_plate(&request.plate).await?.is_some() {
            return Err(conflict_error("Vehicle", "plate", &request.plate));
        }

        let relations = match request.client_id {
            Some(client_id) => {
                self.require_active_client(client_id).await?;
                let relation_type = request
                    .relation_type
                    .as_deref()
                    .unwrap_or(DEFAULT_RELATION_TYPE);
                activate_relation(&[], client_id, relation_type, Utc::now())
            }
            None => Vec::new(),
        };

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            plate: request.plate,
            make: request.make,
            model: request.model,
            year: request.year,
            color: request.color,
            is_active: true,
            relations: sqlx::types::Json(relations),
            created_at: Utc::now(),
        };

        let created = self.vehicles.insert(&vehicle).await?;

        self.audit.log(
            caller,
            ACTION_CREAR_VEHICULO,
            &format!("vehículo {}", created.plate),
        );

        Ok(created)
    }

    /// Edita datos básicos y, si viene `client_id`, activa esa relación y
    /// propaga el cliente a las órdenes huérfanas del vehículo.
    pub async fn update(
        &self,
        caller: &Caller,
        vehicle_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<Vehicle> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
            "update vehicle",
        )?;
        request.validate()?;

        if let Some(plate) = &request.plate {
            validate_plate(plate)?;
            match self.vehicles.find_by_plate(plate).await? {
                Some(existing) if existing.id != vehicle_id => {
                    return Err(conflict_error("Vehicle", "plate", plate));
                }
                _ => {}
            }
        }

        let mut vehicle = self
            .vehicles
            .update_basic(
                vehicle_id,
                request.plate,
                request.make,
                request.model,
                request.year,
                request.color,
            )
            .await?;

        if let Some(client_id) = request.client_id {
            self.require_active_client(client_id).await?;

            let relation_type = request
                .relation_type
                .as_deref()
                .unwrap_or(DEFAULT_RELATION_TYPE);
            let relations =
                activate_relation(&vehicle.relations, client_id, relation_type, Utc::now());

            vehicle = self.vehicles.update_relations(vehicle_id, &relations).await?;

            let backfilled = self.orders.backfill_clients(vehicle_id, client_id).await?;

            self.audit.log(
                caller,
                ACTION_ACTUALIZAR_VEHICULO,
                &format!(
                    "vehículo {} cliente {} ({} órdenes completadas)",
                    vehicle.plate, client_id, backfilled
                ),
            );
        } else {
            self.audit.log(
                caller,
                ACTION_ACTUALIZAR_VEHICULO,
                &format!("vehículo {}", vehicle.plate),
            );
        }

        Ok(vehicle)
    }

    pub async fn get(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))
    }

    pub async fn find_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        validate_plate(plate)?;
        self.vehicles.find_by_plate(plate).await
    }

    /// Listado paginado con el cliente actual resuelto por nombre
    pub async fn list(&self, caller: &Caller, page: i64) -> AppResult<Vec<VehicleListItem>> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
            "list vehicles",
        )?;

        let page = page.max(1);
        let skip = (page - 1) * self.page_size;
        let vehicles = self.vehicles.list_active(skip, self.page_size).await?;

        let client_ids: Vec<Uuid> = vehicles
            .iter()
            .filter_map(|v| v.active_client_id())
            .collect();
        let names: HashMap<Uuid, String> = self
            .users
            .names_by_ids(&client_ids)
            .await?
            .into_iter()
            .collect();

        let items = vehicles
            .into_iter()
            .map(|vehicle| {
                let active = vehicle.relations.iter().find(|r| r.is_active).cloned();
                VehicleListItem {
                    id: vehicle.id,
                    plate: vehicle.plate,
                    make: vehicle.make,
                    model: vehicle.model,
                    year: vehicle.year,
                    color: vehicle.color,
                    client_name: active
                        .as_ref()
                        .map(|r: &ClientRelation| {
                            names
                                .get(&r.client_id)
                                .cloned()
                                .unwrap_or_else(|| "Sin nombre".to_string())
                        }),
                    relation_type: active.map(|r| r.relation_type),
                }
            })
            .collect();

        Ok(items)
    }

    /// Baja lógica del vehículo; su historial de órdenes queda intacto
    pub async fn deactivate(&self, caller: &Caller, vehicle_id: Uuid) -> AppResult<()> {
        require_any(caller, &[UserRole::Administrador], "deactivate vehicle")?;

        let affected = self.vehicles.set_active(vehicle_id, false).await?;
        if affected == 0 {
            return Err(not_found_error("Vehicle", &vehicle_id.to_string()));
        }

        Ok(())
    }

    async fn require_active_client(&self, client_id: Uuid) -> AppResult<()> {
        match self.users.find_by_id(client_id).await? {
            Some(user) if user.role == UserRole::Cliente && user.is_active => Ok(()),
            Some(_) => Err(bad_request_error("The referenced user is not an active client")),
            None => Err(not_found_error("Client", &client_id.to_string())),
        }
    }
}
