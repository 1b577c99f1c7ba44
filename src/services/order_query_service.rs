//! Consultas y enriquecimiento de órdenes
//!
//! El listado combina el ámbito obligatorio del rol con los filtros del
//! usuario, todo como predicados en la consulta. El enriquecimiento resuelve
//! clientes, vehículos y técnicos por lote (una consulta por colección, no
//! por fila); los datos faltantes se rellenan con centinelas legibles.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::service_order::{
    EnrichedOrder, OrderFilters, OrderPage, ServiceOrder, TaskSummary,
};
use crate::models::user::Caller;
use crate::models::vehicle::Vehicle;
use crate::repositories::{
    OrderRepository, OrderSearchCriteria, TaskRepository, UserRepository, VehicleRepository,
};
use crate::services::authorization_service::{can_view_order, order_list_scope};
use crate::utils::errors::{not_found_error, AppResult};

const NO_NAME: &str = "Sin nombre";
const NO_PLATE: &str = "Sin placa";
const NO_MAKE: &str = "Sin marca";
const NO_MODEL: &str = "Sin modelo";
const NO_TECHNICIAN: &str = "Sin técnico";

pub struct OrderQueryService {
    orders: OrderRepository,
    vehicles: VehicleRepository,
    users: UserRepository,
    tasks: TaskRepository,
    page_size: i64,
}

impl OrderQueryService {
    pub fn new(pool: PgPool, page_size: i64) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
            page_size,
        }
    }

    /// Página de órdenes visibles para el invocador bajo los filtros dados
    pub async fn list_orders(
        &self,
        caller: &Caller,
        filters: OrderFilters,
        page: i64,
    ) -> AppResult<OrderPage> {
        let scope = order_list_scope(caller)?;
        let filters = filters.effective();
        let (created_from, created_to) = filters.created_between();

        // El filtro de cliente acepta un id exacto o un fragmento de nombre
        let (client_id, client_name) = match filters.client {
            Some(value) => match Uuid::parse_str(&value) {
                Ok(id) => (Some(id), None),
                Err(_) => (None, Some(value)),
            },
            None => (None, None),
        };

        let criteria = OrderSearchCriteria {
            scope: Some(scope),
            technician_id: filters.technician_id,
            client_id,
            client_name,
            status: filters.status,
            plate: filters.plate,
            created_from,
            created_to,
        };

        let page = page.max(1);
        let skip = (page - 1) * self.page_size;

        let orders = self.orders.search(&criteria, skip, self.page_size).await?;
        let total = self.orders.count_search(&criteria).await?;

        let enriched = self.enrich(orders).await?;

        Ok(OrderPage {
            orders: enriched,
            total,
            page,
            per_page: self.page_size,
            total_pages: (total + self.page_size - 1) / self.page_size,
        })
    }

    /// Detalle de una orden; la visibilidad se decide por recurso, no por
    /// listado: el técnico la ve si tiene una tarea en ella
    pub async fn get_order_detail(
        &self,
        caller: &Caller,
        order_id: Uuid,
    ) -> AppResult<EnrichedOrder> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .filter(|o| o.is_active)
            .ok_or_else(|| not_found_error("Order", &order_id.to_string()))?;

        let tasks = self.tasks.find_by_order(order_id).await?;
        if !can_view_order(caller, &order, &tasks) {
            // No se revela la existencia de órdenes ajenas
            return Err(not_found_error("Order", &order_id.to_string()));
        }

        let mut enriched = self.enrich(vec![order]).await?;
        enriched
            .pop()
            .ok_or_else(|| not_found_error("Order", &order_id.to_string()))
    }

    /// Historial de órdenes de un vehículo, enriquecido
    pub async fn vehicle_history(
        &self,
        caller: &Caller,
        vehicle_id: Uuid,
    ) -> AppResult<Vec<EnrichedOrder>> {
        // El historial hereda la visibilidad del listado
        order_list_scope(caller)?;

        let orders = self.orders.list_by_vehicle(vehicle_id).await?;
        let visible = orders
            .into_iter()
            .filter(|order| order.is_active && can_view_order(caller, order, &[]))
            .collect();

        self.enrich(visible).await
    }

    /// Resuelve cliente, vehículo y tareas de cada orden en lote
    async fn enrich(&self, orders: Vec<ServiceOrder>) -> AppResult<Vec<EnrichedOrder>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let vehicle_ids: Vec<Uuid> = orders.iter().map(|o| o.vehicle_id).collect();
        let client_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.client_id).collect();

        let vehicles: HashMap<Uuid, Vehicle> = self
            .vehicles
            .by_ids(&vehicle_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let client_names: HashMap<Uuid, String> = self
            .users
            .names_by_ids(&client_ids)
            .await?
            .into_iter()
            .collect();

        let mut tasks_by_order: HashMap<Uuid, Vec<TaskSummary>> = HashMap::new();
        for (order_id, task_id, description, status, technician_id, technician_name) in
            self.tasks.summaries_by_order_ids(&order_ids).await?
        {
            tasks_by_order.entry(order_id).or_default().push(TaskSummary {
                id: task_id,
                description,
                status,
                technician_id,
                technician_name: technician_name.unwrap_or_else(|| NO_TECHNICIAN.to_string()),
            });
        }

        let enriched = orders
            .into_iter()
            .map(|order| {
                let vehicle = vehicles.get(&order.vehicle_id);
                let client_name = order
                    .client_id
                    .and_then(|id| client_names.get(&id).cloned())
                    .unwrap_or_else(|| NO_NAME.to_string());

                EnrichedOrder {
                    id: order.id,
                    order_number: order.order_number,
                    client_id: order.client_id,
                    client_name,
                    vehicle_id: order.vehicle_id,
                    vehicle_plate: vehicle
                        .map(|v| v.plate.clone())
                        .unwrap_or_else(|| NO_PLATE.to_string()),
                    vehicle_make: vehicle
                        .and_then(|v| v.make.clone())
                        .unwrap_or_else(|| NO_MAKE.to_string()),
                    vehicle_model: vehicle
                        .and_then(|v| v.model.clone())
                        .unwrap_or_else(|| NO_MODEL.to_string()),
                    description: order.description,
                    status: order.status,
                    registration_status: order.registration_status,
                    assigned_vendor_id: order.assigned_vendor_id,
                    created_by: order.created_by,
                    created_at: order.created_at,
                    updated_at: order.updated_at,
                    tasks: tasks_by_order.remove(&order.id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(enriched)
    }
}
