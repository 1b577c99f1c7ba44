//! Inicialización de logging
//!
//! Las entradas de auditoría salen por el mismo subscriber bajo el target
//! `audit`.

use tracing::Level;

/// Configurar el subscriber global de tracing
pub fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt().with_max_level(level).init();
}
