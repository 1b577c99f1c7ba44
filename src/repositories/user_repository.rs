use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{UpdateUserRequest, User, UserRole};
use crate::utils::errors::{not_found_error, AppResult};

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &User) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, cedula, name, role, phone, address, email, password_hash,
                               password_changed, is_active, specialty, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.cedula)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.password_changed)
        .bind(user.is_active)
        .bind(&user.specialty)
        .bind(user.created_by)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_cedula(&self, cedula: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE cedula = $1")
            .bind(cedula)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn cedula_exists(&self, cedula: &str) -> AppResult<bool> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE cedula = $1)")
                .bind(cedula)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    pub async fn update_profile(&self, id: Uuid, changes: &UpdateUserRequest) -> AppResult<User> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("User", &id.to_string()))?;

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, phone = $3, address = $4, email = $5, specialty = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.clone().unwrap_or(current.name))
        .bind(changes.phone.clone().or(current.phone))
        .bind(changes.address.clone().or(current.address))
        .bind(changes.email.clone().or(current.email))
        .bind(changes.specialty.clone().or(current.specialty))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Reemplaza el hash de contraseña; `changed=false` marca el hash como
    /// provisional (reset a cédula) y fuerza el cambio en el próximo acceso
    pub async fn update_password(&self, id: Uuid, password_hash: &str, changed: bool) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, password_changed = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> AppResult<u64> {
        let result = sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_by_role(&self, role: UserRole, skip: i64, limit: i64) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE role = $1 AND is_active = TRUE
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count_by_role(&self, role: UserRole) -> AppResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1 AND is_active = TRUE")
                .bind(role)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Total de usuarios incluidos los inactivos; decide la regla del
    /// primer usuario del sistema
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    pub async fn count_active(&self) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active = TRUE")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Conteo de usuarios activos por rol en una sola consulta
    pub async fn role_counts(&self) -> AppResult<Vec<(UserRole, i64)>> {
        let counts: Vec<(UserRole, i64)> = sqlx::query_as(
            "SELECT role, COUNT(*) FROM users WHERE is_active = TRUE GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Clientes registrados por un vendedor
    pub async fn count_clients_created_by(&self, vendor_id: Uuid) -> AppResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE role = 'cliente' AND is_active = TRUE AND created_by = $1",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Nombres para enriquecer vistas, en lote
    pub async fn names_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<(Uuid, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(names)
    }

    /// Ids de clientes activos cuyo nombre contiene el texto (case-insensitive)
    pub async fn client_ids_by_name(&self, name_query: &str) -> AppResult<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE role = 'cliente' AND is_active = TRUE AND name ILIKE $1",
        )
        .bind(format!("%{}%", name_query))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
