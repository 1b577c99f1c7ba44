//! Núcleo de flujo de trabajo para un taller de servicio automotriz
//!
//! Órdenes de servicio con numeración secuencial atómica, estado derivado
//! de sus tareas, visibilidad por rol y recepción rápida por placa.

pub mod cache;
pub mod config;
pub mod database;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
