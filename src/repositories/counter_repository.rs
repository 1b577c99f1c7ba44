//! Contadores atómicos para la numeración de órdenes
//!
//! Un upsert con RETURNING hace de lectura-incremento-escritura en una sola
//! sentencia, así dos recepciones concurrentes nunca observan el mismo valor.

use sqlx::PgPool;

use crate::utils::errors::AppResult;

pub struct CounterRepository {
    pool: PgPool,
}

impl CounterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Incrementa el contador de la clave y devuelve el valor post-incremento.
    /// La primera invocación de una clave devuelve 1.
    pub async fn increment(&self, key: &str) -> AppResult<i64> {
        let value: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO order_counters (key, counter)
            VALUES ($1, 1)
            ON CONFLICT (key)
            DO UPDATE SET counter = order_counters.counter + 1
            RETURNING counter
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(value.0)
    }
}
