//! Registro de auditoría
//!
//! Las entradas salen por tracing con target fijo `audit`, en formato
//! `actor | acción | detalles`. El registro nunca bloquea ni hace fallar la
//! operación auditada.

use tracing::info;

use crate::models::user::Caller;

pub const ACTION_CREAR_ORDEN: &str = "CREAR_ORDEN";
pub const ACTION_ELIMINAR_ORDEN: &str = "ELIMINAR_ORDEN";
pub const ACTION_ACTUALIZAR_TAREAS: &str = "ACTUALIZAR_TAREAS";
pub const ACTION_CAMBIAR_ESTADO_ORDEN: &str = "CAMBIAR_ESTADO_ORDEN";
pub const ACTION_CREAR_USUARIO: &str = "CREAR_USUARIO";
pub const ACTION_DESACTIVAR_USUARIO: &str = "DESACTIVAR_USUARIO";
pub const ACTION_CREAR_VEHICULO: &str = "CREAR_VEHICULO";
pub const ACTION_ACTUALIZAR_VEHICULO: &str = "ACTUALIZAR_VEHICULO";
pub const ACTION_REASIGNAR_VENDEDOR: &str = "REASIGNAR_VENDEDOR";

#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log(&self, actor: &Caller, action: &str, details: &str) {
        info!(target: "audit", "{} ({:?}) | {} | {}", actor.name, actor.role, action, details);
    }
}
