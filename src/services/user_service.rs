//! Gestión de usuarios
//!
//! El registro aplica la regla del primer usuario: en un sistema vacío el
//! primer registro se convierte en administrador sin importar el rol pedido.
//! Después, solo administradores crean usuarios de cualquier rol, y los
//! vendedores pueden registrar clientes (quedando como `created_by`).

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::{
    Caller, RegisterUserRequest, UpdateUserRequest, User, UserListResponse, UserResponse,
    UserRole,
};
use crate::repositories::UserRepository;
use crate::services::audit_service::{AuditLogger, ACTION_CREAR_USUARIO, ACTION_DESACTIVAR_USUARIO};
use crate::services::authorization_service::require_any;
use crate::utils::errors::{conflict_error, forbidden_error, not_found_error, AppResult};

pub struct UserService {
    users: UserRepository,
    audit: AuditLogger,
    page_size: i64,
}

impl UserService {
    pub fn new(pool: PgPool, audit: AuditLogger, page_size: i64) -> Self {
        Self {
            users: UserRepository::new(pool),
            audit,
            page_size,
        }
    }

    /// Registra un usuario. `caller` es None solo durante el arranque del
    /// sistema (bootstrap del primer administrador).
    pub async fn register(
        &self,
        caller: Option<&Caller>,
        request: RegisterUserRequest,
    ) -> AppResult<UserResponse> {
        request.validate()?;

        // La cuenta incluye inactivos: la regla del primer usuario se aplica
        // una sola vez en la vida del sistema
        let is_first_user = self.users.count_all().await? == 0;

        let role = if is_first_user {
            UserRole::Administrador
        } else {
            let caller = caller
                .ok_or_else(|| forbidden_error("register user", "authentication required"))?;

            match caller.role {
                UserRole::Administrador => request.role,
                UserRole::Vendedor if request.role == UserRole::Cliente => request.role,
                UserRole::Vendedor => {
                    return Err(forbidden_error("register user", "vendors only register clients"))
                }
                _ => return Err(forbidden_error("register user", "insufficient role")),
            }
        };

        if self.users.cedula_exists(&request.cedula).await? {
            return Err(conflict_error("User", "cedula", &request.cedula));
        }

        let created_by = match caller {
            Some(c) if c.role == UserRole::Vendedor && role == UserRole::Cliente => Some(c.id),
            _ => None,
        };

        let user = User {
            id: Uuid::new_v4(),
            cedula: request.cedula,
            name: request.name,
            role,
            phone: request.phone,
            address: request.address,
            email: request.email,
            password_hash: request.password_hash,
            password_changed: false,
            is_active: true,
            specialty: request.specialty,
            created_by,
            created_at: Utc::now(),
        };

        let created = self.users.insert(&user).await?;

        if let Some(caller) = caller {
            self.audit.log(
                caller,
                ACTION_CREAR_USUARIO,
                &format!("usuario {} rol {:?}", created.cedula, created.role),
            );
        }

        Ok(created.into())
    }

    pub async fn update_profile(
        &self,
        caller: &Caller,
        user_id: Uuid,
        changes: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        changes.validate()?;

        // Cada quien edita su perfil; los administradores editan cualquiera
        if caller.id != user_id {
            require_any(caller, &[UserRole::Administrador], "update profile")?;
        }

        let updated = self.users.update_profile(user_id, &changes).await?;
        Ok(updated.into())
    }

    /// Resetea la contraseña a un hash provisional. El usuario queda marcado
    /// para cambiarla en su próximo acceso.
    pub async fn reset_password(
        &self,
        caller: &Caller,
        user_id: Uuid,
        provisional_hash: &str,
    ) -> AppResult<()> {
        require_any(caller, &[UserRole::Administrador], "reset password")?;

        let affected = self
            .users
            .update_password(user_id, provisional_hash, false)
            .await?;
        if affected == 0 {
            return Err(not_found_error("User", &user_id.to_string()));
        }

        Ok(())
    }

    /// Cambio de contraseña del propio usuario; levanta la marca provisional
    pub async fn change_password(
        &self,
        caller: &Caller,
        user_id: Uuid,
        new_hash: &str,
    ) -> AppResult<()> {
        if caller.id != user_id {
            return Err(forbidden_error("change password", "not the account owner"));
        }

        let affected = self.users.update_password(user_id, new_hash, true).await?;
        if affected == 0 {
            return Err(not_found_error("User", &user_id.to_string()));
        }

        Ok(())
    }

    /// Baja lógica: el usuario desaparece de los listados pero su cédula
    /// sigue reservada
    pub async fn deactivate(&self, caller: &Caller, user_id: Uuid) -> AppResult<()> {
        require_any(caller, &[UserRole::Administrador], "deactivate user")?;

        if caller.id == user_id {
            return Err(forbidden_error("deactivate user", "cannot deactivate own account"));
        }

        let affected = self.users.set_active(user_id, false).await?;
        if affected == 0 {
            return Err(not_found_error("User", &user_id.to_string()));
        }

        self.audit.log(
            caller,
            ACTION_DESACTIVAR_USUARIO,
            &format!("usuario {}", user_id),
        );

        Ok(())
    }

    pub async fn get_user(&self, caller: &Caller, user_id: Uuid) -> AppResult<UserResponse> {
        if caller.id != user_id {
            require_any(
                caller,
                &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
                "view user",
            )?;
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id.to_string()))?;

        Ok(user.into())
    }

    pub async fn list_by_role(
        &self,
        caller: &Caller,
        role: UserRole,
        page: i64,
    ) -> AppResult<UserListResponse> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor, UserRole::Vendedor],
            "list users",
        )?;

        let page = page.max(1);
        let skip = (page - 1) * self.page_size;

        let users = self.users.list_by_role(role, skip, self.page_size).await?;
        let total = self.users.count_by_role(role).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
            total,
            page,
            per_page: self.page_size,
            total_pages: (total + self.page_size - 1) / self.page_size,
        })
    }
}
