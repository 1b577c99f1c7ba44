//! Modelo de User
//!
//! Usuarios de todos los roles en una sola colección. La cédula es la clave
//! de acceso: única e inmutable, incluso para usuarios desactivados (el
//! borrado es lógico).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Administrador,
    Supervisor,
    Tecnico,
    Cliente,
    Vendedor,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub cedula: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub password_changed: bool,
    pub is_active: bool,
    /// Especialidad, solo para técnicos
    pub specialty: Option<String>,
    /// Vendedor que registró a este cliente
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Identidad del usuario que invoca una operación
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: Uuid,
    pub role: UserRole,
    pub name: String,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name.clone(),
        }
    }
}

/// Request para registrar un nuevo usuario
///
/// El hash de contraseña lo provee el colaborador externo; este core no
/// hashea credenciales.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 3, max = 30))]
    pub cedula: String,

    pub role: UserRole,

    pub phone: Option<String>,
    pub address: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub specialty: Option<String>,

    #[validate(length(min = 1))]
    pub password_hash: String,
}

/// Request para actualizar el perfil de un usuario existente
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub specialty: Option<String>,
}

/// Response de usuario para la API (sin hash de contraseña)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub cedula: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub password_changed: bool,
    pub is_active: bool,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            cedula: user.cedula,
            name: user.name,
            role: user.role,
            phone: user.phone,
            address: user.address,
            email: user.email,
            password_changed: user.password_changed,
            is_active: user.is_active,
            specialty: user.specialty,
            created_at: user.created_at,
        }
    }
}

/// Response de usuarios para listados paginados
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}
