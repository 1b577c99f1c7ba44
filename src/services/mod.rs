//! Lógica de negocio

pub mod audit_service;
pub mod authorization_service;
pub mod dashboard_service;
pub mod order_query_service;
pub mod order_service;
pub mod sequence_service;
pub mod status_service;
pub mod task_service;
pub mod user_service;
pub mod vehicle_service;

pub use audit_service::AuditLogger;
pub use dashboard_service::DashboardService;
pub use order_query_service::OrderQueryService;
pub use order_service::OrderService;
pub use sequence_service::SequenceGenerator;
pub use status_service::{derive_order_status, StatusService};
pub use task_service::TaskService;
pub use user_service::UserService;
pub use vehicle_service::VehicleService;
