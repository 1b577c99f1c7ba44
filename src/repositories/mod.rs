//! Capa de acceso a datos sobre PostgreSQL

pub mod counter_repository;
pub mod order_repository;
pub mod task_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use counter_repository::CounterRepository;
pub use order_repository::{OrderRepository, OrderScope, OrderSearchCriteria};
pub use task_repository::TaskRepository;
pub use user_repository::UserRepository;
pub use vehicle_repository::VehicleRepository;
