//! Pruebas de integración contra PostgreSQL
//!
//! Requieren una base de datos accesible vía DATABASE_URL; se ejecutan con
//! `cargo test -- --ignored`. Cada prueba crea sus propios datos con claves
//! únicas, así puede correr contra una base compartida sin limpieza previa.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future;
use sqlx::PgPool;
use uuid::Uuid;

use taller_ordenes::cache::MemoryCache;
use taller_ordenes::config::EnvironmentConfig;
use taller_ordenes::models::service_order::{
    OrderFilters, QuickOrderRequest, RegistrationStatus, ServiceStatus,
};
use taller_ordenes::models::service_task::{NewTaskRequest, TaskPatch};
use taller_ordenes::models::user::{Caller, User, UserRole};
use taller_ordenes::models::vehicle::UpdateVehicleRequest;
use taller_ordenes::repositories::{OrderRepository, UserRepository};
use taller_ordenes::services::SequenceGenerator;
use taller_ordenes::state::AppState;

async fn setup() -> AppState {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url).await.expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");

    let config = EnvironmentConfig {
        environment: "test".to_string(),
        database_url,
        redis_url: String::new(),
        stats_cache_ttl: 60,
        page_size: 20,
    };

    AppState::with_cache(pool, config, Arc::new(MemoryCache::new()))
}

async fn insert_user(pool: &PgPool, role: UserRole) -> User {
    let repo = UserRepository::new(pool.clone());
    let suffix = Uuid::new_v4();
    let user = User {
        id: Uuid::new_v4(),
        cedula: format!("CED-{}", suffix),
        name: format!("Usuario {:?} {}", role, suffix),
        role,
        phone: None,
        address: None,
        email: None,
        password_hash: "hash-de-prueba".to_string(),
        password_changed: true,
        is_active: true,
        specialty: None,
        created_by: None,
        created_at: Utc::now(),
    };
    repo.insert(&user).await.expect("insert user")
}

fn unique_plate() -> String {
    format!("TST-{}", &Uuid::new_v4().simple().to_string()[..10])
}

fn quick_request(plate: &str) -> QuickOrderRequest {
    QuickOrderRequest {
        plate: plate.to_string(),
        description: Some("Revisión general".to_string()),
        make: Some("Toyota".to_string()),
        model: Some("Corolla".to_string()),
        year: Some(2020),
        color: None,
        client_id: None,
    }
}

#[tokio::test]
#[ignore]
async fn concurrent_sequence_numbers_are_unique() {
    let state = setup().await;
    let generator = SequenceGenerator::new(state.pool.clone());
    let now = Utc::now();

    let calls: Vec<_> = (0..25).map(|_| generator.next_order_number(now)).collect();
    let results = future::join_all(calls).await;

    let mut numbers = HashSet::new();
    let mut yearly = HashSet::new();
    for result in results {
        let sequence = result.expect("sequence");
        assert!(numbers.insert(sequence.order_number.clone()), "duplicated number");
        assert!(yearly.insert(sequence.yearly_seq), "duplicated yearly counter");
        assert!(sequence.order_number.starts_with("ORD-"));
    }
    assert_eq!(numbers.len(), 25);
}

#[tokio::test]
#[ignore]
async fn quick_intake_without_client_backfills_on_relation_activation() {
    let state = setup().await;
    let admin = Caller::from(&insert_user(&state.pool, UserRole::Administrador).await);
    let client = insert_user(&state.pool, UserRole::Cliente).await;

    let plate = unique_plate();
    let order = state
        .orders
        .create_quick_order(&admin, quick_request(&plate))
        .await
        .expect("quick order");

    assert_eq!(order.client_id, None);
    assert_eq!(order.registration_status, RegistrationStatus::Pending);
    assert_eq!(order.status, ServiceStatus::Pending);

    // Activar la relación con el cliente propaga el cliente a la orden
    state
        .vehicles
        .update(
            &admin,
            order.vehicle_id,
            UpdateVehicleRequest {
                client_id: Some(client.id),
                ..Default::default()
            },
        )
        .await
        .expect("activate relation");

    let orders = OrderRepository::new(state.pool.clone());
    let refreshed = orders.find_by_id(order.id).await.expect("find").expect("exists");
    assert_eq!(refreshed.client_id, Some(client.id));
    assert_eq!(refreshed.registration_status, RegistrationStatus::Completed);
}

#[tokio::test]
#[ignore]
async fn vendor_only_sees_own_assigned_orders() {
    let state = setup().await;
    let vendor_a = Caller::from(&insert_user(&state.pool, UserRole::Vendedor).await);
    let vendor_b = Caller::from(&insert_user(&state.pool, UserRole::Vendedor).await);

    let order = state
        .orders
        .create_quick_order(&vendor_a, quick_request(&unique_plate()))
        .await
        .expect("quick order");

    // El vendedor que recibió queda asignado a la orden
    assert_eq!(order.assigned_vendor_id, Some(vendor_a.id));

    let own_page = state
        .order_queries
        .list_orders(&vendor_a, OrderFilters::default(), 1)
        .await
        .expect("list as vendor a");
    assert!(own_page.orders.iter().any(|o| o.id == order.id));

    let other_page = state
        .order_queries
        .list_orders(&vendor_b, OrderFilters::default(), 1)
        .await
        .expect("list as vendor b");
    assert!(!other_page.orders.iter().any(|o| o.id == order.id));
    assert!(other_page
        .orders
        .iter()
        .all(|o| o.assigned_vendor_id == Some(vendor_b.id)));
}

#[tokio::test]
#[ignore]
async fn order_status_follows_task_lifecycle() {
    let state = setup().await;
    let admin = Caller::from(&insert_user(&state.pool, UserRole::Administrador).await);
    let technician = insert_user(&state.pool, UserRole::Tecnico).await;

    let order = state
        .orders
        .create_quick_order(&admin, quick_request(&unique_plate()))
        .await
        .expect("quick order");

    let task_a = state
        .tasks
        .add_task(
            &admin,
            order.id,
            NewTaskRequest {
                technician_id: technician.id,
                description: "Cambio de aceite".to_string(),
            },
        )
        .await
        .expect("task a");
    let task_b = state
        .tasks
        .add_task(
            &admin,
            order.id,
            NewTaskRequest {
                technician_id: technician.id,
                description: "Alineación".to_string(),
            },
        )
        .await
        .expect("task b");

    let orders = OrderRepository::new(state.pool.clone());

    // Una tarea completada entre pendientes: la orden avanza
    state
        .tasks
        .update_task(
            &admin,
            task_a.id,
            TaskPatch {
                status: Some(ServiceStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("complete a");
    let current = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::InProgress);

    // Todas completadas: la orden se completa
    state
        .tasks
        .update_task(
            &admin,
            task_b.id,
            TaskPatch {
                status: Some(ServiceStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("complete b");
    let current = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::Completed);

    // Reabrir una tarea regresa la orden a en progreso
    state
        .tasks
        .update_task(
            &admin,
            task_b.id,
            TaskPatch {
                status: Some(ServiceStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .expect("reopen b");
    let current = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(current.status, ServiceStatus::InProgress);
}

#[tokio::test]
#[ignore]
async fn technician_cannot_touch_foreign_tasks() {
    let state = setup().await;
    let admin = Caller::from(&insert_user(&state.pool, UserRole::Administrador).await);
    let tech_a = insert_user(&state.pool, UserRole::Tecnico).await;
    let tech_b = insert_user(&state.pool, UserRole::Tecnico).await;

    let order = state
        .orders
        .create_quick_order(&admin, quick_request(&unique_plate()))
        .await
        .expect("quick order");

    let task = state
        .tasks
        .add_task(
            &admin,
            order.id,
            NewTaskRequest {
                technician_id: tech_a.id,
                description: "Frenos".to_string(),
            },
        )
        .await
        .expect("task");

    let intruder = Caller::from(&tech_b);
    let result = state
        .tasks
        .update_task(
            &intruder,
            task.id,
            TaskPatch {
                status: Some(ServiceStatus::InProgress),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_err());

    // El técnico asignado sí puede avanzar su tarea
    let owner = Caller::from(&tech_a);
    let updated = state
        .tasks
        .update_task(
            &owner,
            task.id,
            TaskPatch {
                status: Some(ServiceStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .expect("own task");
    assert_eq!(updated.status, ServiceStatus::InProgress);
}
