//! Reglas de autorización por rol
//!
//! Las reglas de visibilidad de listados se expresan como un ámbito
//! ([`OrderScope`]) que la capa de repositorio aplica como predicado SQL
//! obligatorio; nunca se filtra en memoria sobre datos ya leídos.

use crate::models::service_task::ServiceTask;
use crate::models::user::{Caller, UserRole};
use crate::models::ServiceOrder;
use crate::repositories::OrderScope;
use crate::utils::errors::{forbidden_error, AppResult};

/// Verifica que el rol del invocador esté en la lista permitida
pub fn require_any(caller: &Caller, allowed: &[UserRole], operation: &str) -> AppResult<()> {
    if allowed.contains(&caller.role) {
        Ok(())
    } else {
        Err(forbidden_error(operation, "insufficient role"))
    }
}

/// Ámbito del listado de órdenes según el rol del invocador.
///
/// Los técnicos no listan órdenes; su vista del trabajo es por tareas.
pub fn order_list_scope(caller: &Caller) -> AppResult<OrderScope> {
    match caller.role {
        UserRole::Administrador | UserRole::Supervisor => Ok(OrderScope::All),
        UserRole::Vendedor => Ok(OrderScope::Vendor(caller.id)),
        UserRole::Cliente => Ok(OrderScope::Client(caller.id)),
        UserRole::Tecnico => Err(forbidden_error("list orders", "technicians work by tasks")),
    }
}

/// Decide si el invocador puede ver el detalle de una orden concreta.
/// El técnico la ve solo si tiene al menos una tarea en ella.
pub fn can_view_order(caller: &Caller, order: &ServiceOrder, tasks: &[ServiceTask]) -> bool {
    match caller.role {
        UserRole::Administrador | UserRole::Supervisor => true,
        UserRole::Vendedor => order.assigned_vendor_id == Some(caller.id),
        UserRole::Cliente => order.client_id == Some(caller.id),
        UserRole::Tecnico => tasks.iter().any(|t| t.technician_id == caller.id),
    }
}

/// Decide si el invocador puede modificar una tarea. El técnico solo toca
/// las suyas; vendedores y clientes nunca mutan tareas.
pub fn can_mutate_task(caller: &Caller, task: &ServiceTask) -> bool {
    match caller.role {
        UserRole::Administrador | UserRole::Supervisor => true,
        UserRole::Tecnico => task.technician_id == caller.id,
        UserRole::Vendedor | UserRole::Cliente => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::service_order::{RegistrationStatus, ServiceStatus};

    fn caller(role: UserRole) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            role,
            name: "Prueba".to_string(),
        }
    }

    fn order(client_id: Option<Uuid>, vendor_id: Option<Uuid>) -> ServiceOrder {
        ServiceOrder {
            id: Uuid::new_v4(),
            order_number: "ORD-2025-01-0001-000001".to_string(),
            client_id,
            vehicle_id: Uuid::new_v4(),
            description: None,
            status: ServiceStatus::Pending,
            registration_status: RegistrationStatus::Pending,
            assigned_vendor_id: vendor_id,
            created_by: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(order_id: Uuid, technician_id: Uuid) -> ServiceTask {
        ServiceTask {
            id: Uuid::new_v4(),
            order_id,
            technician_id,
            description: "Cambio de aceite".to_string(),
            status: ServiceStatus::Pending,
            observations: String::new(),
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_and_supervisor_see_all_orders() {
        assert_eq!(
            order_list_scope(&caller(UserRole::Administrador)).unwrap(),
            OrderScope::All
        );
        assert_eq!(
            order_list_scope(&caller(UserRole::Supervisor)).unwrap(),
            OrderScope::All
        );
    }

    #[test]
    fn test_vendor_scope_is_bound_to_own_id() {
        let vendor = caller(UserRole::Vendedor);
        assert_eq!(
            order_list_scope(&vendor).unwrap(),
            OrderScope::Vendor(vendor.id)
        );
    }

    #[test]
    fn test_client_scope_is_bound_to_own_id() {
        let client = caller(UserRole::Cliente);
        assert_eq!(
            order_list_scope(&client).unwrap(),
            OrderScope::Client(client.id)
        );
    }

    #[test]
    fn test_technician_cannot_list_orders() {
        assert!(order_list_scope(&caller(UserRole::Tecnico)).is_err());
    }

    #[test]
    fn test_vendor_sees_only_assigned_order_detail() {
        let vendor = caller(UserRole::Vendedor);
        let own = order(None, Some(vendor.id));
        let other = order(None, Some(Uuid::new_v4()));

        assert!(can_view_order(&vendor, &own, &[]));
        assert!(!can_view_order(&vendor, &other, &[]));
    }

    #[test]
    fn test_technician_sees_order_only_with_own_task() {
        let tech = caller(UserRole::Tecnico);
        let ord = order(None, None);

        assert!(!can_view_order(&tech, &ord, &[]));
        assert!(!can_view_order(&tech, &ord, &[task(ord.id, Uuid::new_v4())]));
        assert!(can_view_order(&tech, &ord, &[task(ord.id, tech.id)]));
    }

    #[test]
    fn test_technician_mutates_only_own_tasks() {
        let tech = caller(UserRole::Tecnico);
        let own = task(Uuid::new_v4(), tech.id);
        let foreign = task(Uuid::new_v4(), Uuid::new_v4());

        assert!(can_mutate_task(&tech, &own));
        assert!(!can_mutate_task(&tech, &foreign));
    }

    #[test]
    fn test_vendor_and_client_never_mutate_tasks() {
        let t = task(Uuid::new_v4(), Uuid::new_v4());
        assert!(!can_mutate_task(&caller(UserRole::Vendedor), &t));
        assert!(!can_mutate_task(&caller(UserRole::Cliente), &t));
    }
}
