//! Generador de números de orden
//!
//! Dos contadores independientes (mensual y anual) se incrementan de forma
//! atómica en el store y se componen en un número legible. Los contadores
//! nunca se reusan ni retroceden; cada mes y cada año arrancan claves nuevas.

use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;

use crate::models::counter::OrderSequence;
use crate::repositories::CounterRepository;
use crate::utils::errors::AppResult;

/// Clave del contador anual
pub fn yearly_key(year: i32) -> String {
    format!("year:{}", year)
}

/// Clave del contador mensual
pub fn monthly_key(year: i32, month: u32) -> String {
    format!("month:{}-{:02}", year, month)
}

/// Compone el número legible: ORD-AAAA-MM-{mensual:4}-{anual:6}
pub fn format_order_number(year: i32, month: u32, monthly_seq: i64, yearly_seq: i64) -> String {
    format!(
        "ORD-{}-{:02}-{:04}-{:06}",
        year, month, monthly_seq, yearly_seq
    )
}

pub struct SequenceGenerator {
    counters: CounterRepository,
}

impl SequenceGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self {
            counters: CounterRepository::new(pool),
        }
    }

    /// Genera el siguiente número de orden para el instante dado.
    ///
    /// Los dos incrementos no van en una transacción: un número "quemado"
    /// por un fallo a mitad de camino deja un hueco en la secuencia, nunca
    /// un duplicado.
    pub async fn next_order_number(&self, now: DateTime<Utc>) -> AppResult<OrderSequence> {
        let year = now.year();
        let month = now.month();

        let yearly_seq = self.counters.increment(&yearly_key(year)).await?;
        let monthly_seq = self.counters.increment(&monthly_key(year, month)).await?;

        Ok(OrderSequence {
            order_number: format_order_number(year, month, monthly_seq, yearly_seq),
            monthly_seq,
            yearly_seq,
            year,
            month,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        assert_eq!(
            format_order_number(2025, 3, 7, 142),
            "ORD-2025-03-0007-000142"
        );
    }

    #[test]
    fn test_order_number_pads_without_truncating() {
        // Los anchos son mínimos: secuencias grandes no se recortan
        assert_eq!(
            format_order_number(2025, 12, 12345, 1234567),
            "ORD-2025-12-12345-1234567"
        );
    }

    #[test]
    fn test_counter_keys_partition_by_period() {
        assert_eq!(yearly_key(2025), "year:2025");
        assert_eq!(monthly_key(2025, 3), "month:2025-03");
        assert_eq!(monthly_key(2025, 11), "month:2025-11");
        // Meses iguales de años distintos usan claves distintas
        assert_ne!(monthly_key(2024, 3), monthly_key(2025, 3));
    }
}
