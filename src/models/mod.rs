//! Modelos de dominio

pub mod counter;
pub mod service_order;
pub mod service_task;
pub mod user;
pub mod vehicle;

pub use counter::OrderSequence;
pub use service_order::{
    EnrichedOrder, OrderFilters, OrderPage, QuickOrderRequest, RegistrationStatus, ServiceOrder,
    ServiceStatus, TaskSummary,
};
pub use service_task::{
    NewTaskRequest, ServiceTask, TaskBulkEdit, TaskCounts, TaskPatch, TaskUpdate,
    TechnicianTaskView,
};
pub use user::{Caller, RegisterUserRequest, UpdateUserRequest, User, UserListResponse, UserResponse, UserRole};
pub use vehicle::{
    activate_relation, ClientRelation, CreateVehicleRequest, UpdateVehicleRequest, Vehicle,
    VehicleListItem,
};
