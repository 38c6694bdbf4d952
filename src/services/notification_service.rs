// src/services/notification_service.rs

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, NotificationRepository, UserRepository},
    models::{
        notification::{NewNotification, Notification},
        user::PermissionLevel,
    },
};

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    assignment_repo: AssignmentRepository,
    user_repo: UserRepository,
    alert_days: i64,
    pool: SqlitePool,
}

impl NotificationService {
    pub fn new(
        repo: NotificationRepository,
        assignment_repo: AssignmentRepository,
        user_repo: UserRepository,
        alert_days: i64,
        pool: SqlitePool,
    ) -> Self {
        Self { repo, assignment_repo, user_repo, alert_days, pool }
    }

    pub async fn notify(
        &self,
        usuario_id: i64,
        payload: NewNotification,
    ) -> Result<Notification, AppError> {
        payload.validate()?;
        self.repo.create(&self.pool, usuario_id, &payload).await
    }

    /// Envia a mesma notificação para todos os usuários ativos.
    pub async fn broadcast(&self, payload: NewNotification) -> Result<Vec<Notification>, AppError> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;
        let ids = self
            .user_repo
            .list_active_ids(&mut *tx, PermissionLevel::Basico)
            .await?;

        let mut sent = Vec::with_capacity(ids.len());
        for usuario_id in ids {
            sent.push(self.repo.create(&mut *tx, usuario_id, &payload).await?);
        }
        tx.commit().await?;

        tracing::info!("📣 Notificação \"{}\" enviada a {} usuário(s)", payload.titulo, sent.len());
        Ok(sent)
    }

    pub async fn get(&self, id: i64) -> Result<Notification, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Notificação", id))
    }

    pub async fn list_for_user(
        &self,
        usuario_id: i64,
        only_unread: bool,
    ) -> Result<Vec<Notification>, AppError> {
        self.repo.list_by_user(usuario_id, only_unread).await
    }

    pub async fn count_unread(&self, usuario_id: i64) -> Result<i64, AppError> {
        self.repo.count_unread(usuario_id).await
    }

    /// Marca como lida. Só vale para notificações ainda não lidas.
    pub async fn mark_read(&self, id: i64) -> Result<Notification, AppError> {
        match self.repo.mark_read(id, Utc::now().naive_utc()).await? {
            Some(notification) => Ok(notification),
            None => {
                let current = self.get(id).await?;
                Err(AppError::BusinessRule(format!(
                    "A notificação {} não está como não lida ({:?}).",
                    id, current.status
                )))
            }
        }
    }

    pub async fn mark_all_read(&self, usuario_id: i64) -> Result<u64, AppError> {
        self.repo
            .mark_all_read(usuario_id, Utc::now().naive_utc())
            .await
    }

    pub async fn archive(&self, id: i64) -> Result<Notification, AppError> {
        match self.repo.archive(id).await? {
            Some(notification) => Ok(notification),
            None => {
                self.get(id).await?;
                Err(AppError::BusinessRule(format!("A notificação {} já está arquivada.", id)))
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("Notificação", id));
        }
        Ok(())
    }

    /// Avisa gestores e administradores ativos sobre designações cuja devolução
    /// cai entre `hoje` e `hoje + NOTIFICATION_ALERT_DAYS`. Quem já tem um alerta
    /// não lido para a mesma designação não recebe outro.
    pub async fn sweep_due_assignments(&self, hoje: NaiveDate) -> Result<Vec<Notification>, AppError> {
        let limite = Duration::try_days(self.alert_days)
            .filter(|d| *d >= Duration::zero())
            .and_then(|d| hoje.checked_add_signed(d))
            .ok_or_else(|| {
                anyhow::anyhow!("NOTIFICATION_ALERT_DAYS fora do intervalo: {}", self.alert_days)
            })?;

        let mut tx = self.pool.begin().await?;

        let due = self.assignment_repo.list_due(&mut *tx, hoje, limite).await?;
        if due.is_empty() {
            tracing::debug!("Nenhuma designação vencendo até {}", limite);
            return Ok(Vec::new());
        }

        let managers = self
            .user_repo
            .list_active_ids(&mut *tx, PermissionLevel::Gestor)
            .await?;

        let mut created = Vec::new();
        for item in &due {
            let alert = item.to_alert();
            for &usuario_id in &managers {
                if self
                    .repo
                    .has_unread_alert(&mut *tx, usuario_id, &item.entidade, item.entidade_id)
                    .await?
                {
                    continue;
                }
                created.push(self.repo.create(&mut *tx, usuario_id, &alert).await?);
            }
        }

        tx.commit().await?;

        tracing::info!(
            "⏰ {} designação(ões) perto do vencimento, {} alerta(s) criado(s)",
            due.len(),
            created.len()
        );
        Ok(created)
    }
}
