//! Gestión de tareas de servicio
//!
//! Toda mutación de tareas (alta, parche, edición masiva) termina en una
//! única re-derivación del estado de la orden padre. Los marcadores de
//! inicio/fin de la tarea siguen las transiciones de estado: arrancar fija
//! `start_time` una sola vez, completar fija `end_time`, reabrir lo limpia.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::service_order::ServiceStatus;
use crate::models::service_task::{
    NewTaskRequest, ServiceTask, TaskBulkEdit, TaskCounts, TaskPatch, TechnicianTaskView,
};
use crate::models::user::{Caller, UserRole};
use crate::repositories::{OrderRepository, TaskRepository, UserRepository};
use crate::services::audit_service::{
    AuditLogger, ACTION_ACTUALIZAR_TAREAS, ACTION_CAMBIAR_ESTADO_ORDEN,
};
use crate::services::authorization_service::{can_mutate_task, require_any};
use crate::services::status_service::StatusService;
use crate::utils::errors::{bad_request_error, forbidden_error, not_found_error, AppResult};

pub struct TaskService {
    tasks: TaskRepository,
    orders: OrderRepository,
    users: UserRepository,
    status: StatusService,
    audit: AuditLogger,
}

impl TaskService {
    pub fn new(pool: PgPool, audit: AuditLogger, status: StatusService) -> Self {
        Self {
            tasks: TaskRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            status,
            audit,
        }
    }

    pub async fn add_task(
        &self,
        caller: &Caller,
        order_id: Uuid,
        request: NewTaskRequest,
    ) -> AppResult<ServiceTask> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor],
            "add task",
        )?;
        request.validate()?;

        self.require_active_order(order_id).await?;
        self.require_active_technician(request.technician_id).await?;

        let now = chrono::Utc::now();
        let created = self
            .tasks
            .insert(&ServiceTask {
                id: Uuid::new_v4(),
                order_id,
                technician_id: request.technician_id,
                description: request.description,
                status: ServiceStatus::Pending,
                observations: String::new(),
                start_time: None,
                end_time: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.recompute_and_audit(caller, order_id).await?;

        Ok(created)
    }

    /// Parche parcial de una tarea. Un técnico solo toca las suyas, y solo
    /// estado y observaciones; reasignar o reescribir la descripción es
    /// trabajo de supervisión.
    pub async fn update_task(
        &self,
        caller: &Caller,
        task_id: Uuid,
        patch: TaskPatch,
    ) -> AppResult<ServiceTask> {
        if patch.is_empty() {
            return Err(bad_request_error("Empty task patch"));
        }

        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| not_found_error("Task", &task_id.to_string()))?;

        if !can_mutate_task(caller, &task) {
            return Err(forbidden_error("update task", "not the assigned technician"));
        }

        if caller.role == UserRole::Tecnico
            && (patch.technician_id.is_some() || patch.description.is_some())
        {
            return Err(forbidden_error(
                "update task",
                "technicians only change status and observations",
            ));
        }

        if let Some(technician_id) = patch.technician_id {
            self.require_active_technician(technician_id).await?;
        }

        self.require_active_order(task.order_id).await?;

        let updated = self.tasks.update(task_id, &patch).await?;
        self.apply_time_markers(&task, &updated).await?;
        self.recompute_and_audit(caller, task.order_id).await?;

        Ok(updated)
    }

    /// Edición masiva de las tareas de una orden: primero borra, luego
    /// parchea, por último crea. La re-derivación del estado corre una sola
    /// vez al final.
    pub async fn bulk_edit(
        &self,
        caller: &Caller,
        order_id: Uuid,
        edit: TaskBulkEdit,
    ) -> AppResult<Vec<ServiceTask>> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor],
            "edit tasks",
        )?;

        self.require_active_order(order_id).await?;

        for task_id in &edit.delete_ids {
            let task = self
                .tasks
                .find_by_id(*task_id)
                .await?
                .ok_or_else(|| not_found_error("Task", &task_id.to_string()))?;
            if task.order_id != order_id {
                return Err(bad_request_error("Task does not belong to this order"));
            }
            self.tasks.delete(*task_id).await?;
        }

        for update in &edit.updates {
            if update.patch.is_empty() {
                continue;
            }
            let task = self
                .tasks
                .find_by_id(update.id)
                .await?
                .ok_or_else(|| not_found_error("Task", &update.id.to_string()))?;
            if task.order_id != order_id {
                return Err(bad_request_error("Task does not belong to this order"));
            }
            if let Some(technician_id) = update.patch.technician_id {
                self.require_active_technician(technician_id).await?;
            }
            let updated = self.tasks.update(update.id, &update.patch).await?;
            self.apply_time_markers(&task, &updated).await?;
        }

        for request in &edit.new_tasks {
            request.validate()?;
            self.require_active_technician(request.technician_id).await?;

            let now = chrono::Utc::now();
            self.tasks
                .insert(&ServiceTask {
                    id: Uuid::new_v4(),
                    order_id,
                    technician_id: request.technician_id,
                    description: request.description.clone(),
                    status: ServiceStatus::Pending,
                    observations: String::new(),
                    start_time: None,
                    end_time: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }

        self.audit.log(
            caller,
            ACTION_ACTUALIZAR_TAREAS,
            &format!(
                "orden {} (-{} ~{} +{})",
                order_id,
                edit.delete_ids.len(),
                edit.updates.len(),
                edit.new_tasks.len()
            ),
        );

        if let Some((old, new)) = self.status.recompute(order_id).await? {
            self.audit.log(
                caller,
                ACTION_CAMBIAR_ESTADO_ORDEN,
                &format!("orden {} {:?} -> {:?}", order_id, old, new),
            );
        }

        self.tasks.find_by_order(order_id).await
    }

    /// Re-derivación explícita del estado de una orden, para corregir una
    /// orden que haya quedado desincronizada
    pub async fn recompute_order_status(
        &self,
        caller: &Caller,
        order_id: Uuid,
    ) -> AppResult<Option<(ServiceStatus, ServiceStatus)>> {
        require_any(
            caller,
            &[UserRole::Administrador, UserRole::Supervisor],
            "recompute order status",
        )?;

        self.require_active_order(order_id).await?;

        let change = self.status.recompute(order_id).await?;
        if let Some((old, new)) = change {
            self.audit.log(
                caller,
                ACTION_CAMBIAR_ESTADO_ORDEN,
                &format!("orden {} {:?} -> {:?}", order_id, old, new),
            );
        }

        Ok(change)
    }

    /// Tareas del técnico con su orden y vehículo, opcionalmente por estado
    pub async fn list_technician_tasks(
        &self,
        caller: &Caller,
        technician_id: Uuid,
        status: Option<ServiceStatus>,
    ) -> AppResult<Vec<TechnicianTaskView>> {
        if caller.id != technician_id {
            require_any(
                caller,
                &[UserRole::Administrador, UserRole::Supervisor],
                "list technician tasks",
            )?;
        }

        self.tasks.technician_views(technician_id, status).await
    }

    pub async fn task_counts(&self, caller: &Caller, technician_id: Uuid) -> AppResult<TaskCounts> {
        if caller.id != technician_id {
            require_any(
                caller,
                &[UserRole::Administrador, UserRole::Supervisor],
                "view task counts",
            )?;
        }

        self.tasks.counts_for_technician(technician_id).await
    }

    async fn require_active_order(&self, order_id: Uuid) -> AppResult<()> {
        match self.orders.find_by_id(order_id).await? {
            Some(order) if order.is_active => Ok(()),
            _ => Err(not_found_error("Order", &order_id.to_string())),
        }
    }

    async fn require_active_technician(&self, technician_id: Uuid) -> AppResult<()> {
        match self.users.find_by_id(technician_id).await? {
            Some(user) if user.role == UserRole::Tecnico && user.is_active => Ok(()),
            Some(_) => Err(bad_request_error("The referenced user is not an active technician")),
            None => Err(not_found_error("Technician", &technician_id.to_string())),
        }
    }

    /// Marca inicio/fin según la transición de estado de la tarea
    async fn apply_time_markers(&self, before: &ServiceTask, after: &ServiceTask) -> AppResult<()> {
        if before.status == after.status {
            return Ok(());
        }

        let start = matches!(
            after.status,
            ServiceStatus::InProgress | ServiceStatus::Completed
        );
        let end = after.status == ServiceStatus::Completed;
        let clear_end = before.status == ServiceStatus::Completed && !end;

        self.tasks.set_times(after.id, start, end, clear_end).await?;
        Ok(())
    }

    async fn recompute_and_audit(&self, caller: &Caller, order_id: Uuid) -> AppResult<()> {
        if let Some((old, new)) = self.status.recompute(order_id).await? {
            self.audit.log(
                caller,
                ACTION_CAMBIAR_ESTADO_ORDEN,
                &format!("orden {} {:?} -> {:?}", order_id, old, new),
            );
        }
        Ok(())
    }
}
