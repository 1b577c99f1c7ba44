//! Contadores de números de orden

use serde::Serialize;

/// Resultado del generador de secuencia: número legible más los contadores
/// post-incremento que lo componen
#[derive(Debug, Clone, Serialize)]
pub struct OrderSequence {
    pub order_number: String,
    pub monthly_seq: i64,
    pub yearly_seq: i64,
    pub year: i32,
    pub month: u32,
}
