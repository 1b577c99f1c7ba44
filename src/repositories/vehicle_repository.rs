use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::{ClientRelation, Vehicle};
use crate::utils::errors::{not_found_error, AppResult};

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, plate, make, model, year, color, is_active, relations, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.plate)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(vehicle.is_active)
        .bind(&vehicle.relations)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Búsqueda exacta por placa (case-sensitive, clave de recepción rápida)
    pub async fn find_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE plate = $1")
            .bind(plate)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    pub async fn update_basic(
        &self,
        id: Uuid,
        plate: Option<String>,
        make: Option<String>,
        model: Option<String>,
        year: Option<i32>,
        color: Option<String>,
    ) -> AppResult<Vehicle> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        let updated = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET plate = $2, make = $3, model = $4, year = $5, color = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(plate.unwrap_or(current.plate))
        .bind(make.or(current.make))
        .bind(model.or(current.model))
        .bind(year.or(current.year))
        .bind(color.or(current.color))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Reemplaza la lista completa de relaciones en una sola escritura; así
    /// el invariante "a lo sumo una activa" no queda expuesto entre pasos
    pub async fn update_relations(
        &self,
        id: Uuid,
        relations: &[ClientRelation],
    ) -> AppResult<Vehicle> {
        let updated = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET relations = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(sqlx::types::Json(relations))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<u64> {
        let result = sqlx::query("UPDATE vehicles SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_active(&self, skip: i64, limit: i64) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE is_active = TRUE
            ORDER BY plate ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn count_active(&self) -> AppResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM vehicles WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Vehículos en lote para enriquecer listados de órdenes
    pub async fn by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Vehicle>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let vehicles =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(vehicles)
    }
}
