// src/services/activity_service.rs

use validator::Validate;

use crate::{
    common::error::AppError,
    db::ActivityRepository,
    models::activity::{ActionKind, ActivityLogDetails, ActivityLogEntry, NewActivity},
};

// Registro de auditoria das ações dos usuários
#[derive(Clone)]
pub struct ActivityService {
    repo: ActivityRepository,
    pool: sqlx::SqlitePool,
}

impl ActivityService {
    pub fn new(repo: ActivityRepository, pool: sqlx::SqlitePool) -> Self {
        Self { repo, pool }
    }

    pub async fn record(&self, payload: NewActivity) -> Result<ActivityLogEntry, AppError> {
        payload.validate()?;
        let entry = self.repo.create(&self.pool, &payload).await?;
        tracing::debug!(
            "Atividade {:?} do usuário {}: {}",
            entry.tipo_acao,
            entry.usuario_id,
            entry.descricao
        );
        Ok(entry)
    }

    // Atalho para ações sobre uma entidade ("territorio", 3)
    pub async fn record_on(
        &self,
        usuario_id: i64,
        tipo_acao: ActionKind,
        descricao: impl Into<String>,
        entidade: &str,
        entidade_id: i64,
    ) -> Result<ActivityLogEntry, AppError> {
        self.record(NewActivity {
            usuario_id,
            tipo_acao,
            descricao: descricao.into(),
            entidade: Some(entidade.to_string()),
            entidade_id: Some(entidade_id),
        })
        .await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogDetails>, AppError> {
        self.repo.recent(limit).await
    }

    pub async fn for_user(&self, usuario_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>, AppError> {
        self.repo.list_by_user(usuario_id, limit).await
    }

    pub async fn for_entity(
        &self,
        entidade: &str,
        entidade_id: i64,
    ) -> Result<Vec<ActivityLogDetails>, AppError> {
        self.repo.list_by_entity(entidade, entidade_id).await
    }
}
