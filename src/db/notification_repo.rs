// src/db/notification_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::notification::{NewNotification, Notification},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        usuario_id: i64,
        payload: &NewNotification,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notificacoes (usuario_id, tipo, titulo, mensagem, link, entidade, entidade_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(usuario_id)
        .bind(payload.tipo)
        .bind(&payload.titulo)
        .bind(&payload.mensagem)
        .bind(&payload.link)
        .bind(&payload.entidade)
        .bind(payload.entidade_id)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(notification)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notificacoes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notification)
    }

    pub async fn list_by_user(
        &self,
        usuario_id: i64,
        only_unread: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notificacoes
            WHERE usuario_id = ? AND (? = 0 OR status = 'nao_lida')
            ORDER BY data_criacao DESC, id DESC
            "#,
        )
        .bind(usuario_id)
        .bind(only_unread)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn count_unread(&self, usuario_id: i64) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notificacoes WHERE usuario_id = ? AND status = 'nao_lida'",
        )
        .bind(usuario_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Alerta ainda não lido para a mesma entidade (evita duplicar avisos).
    pub async fn has_unread_alert<'e, E>(
        &self,
        executor: E,
        usuario_id: i64,
        entidade: &str,
        entidade_id: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notificacoes
                WHERE usuario_id = ? AND entidade = ? AND entidade_id = ?
                  AND tipo = 'alerta' AND status = 'nao_lida'
            )
            "#,
        )
        .bind(usuario_id)
        .bind(entidade)
        .bind(entidade_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // Só sai de "nao_lida"; já lidas ou arquivadas ficam como estão
    pub async fn mark_read(
        &self,
        id: i64,
        when: NaiveDateTime,
    ) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notificacoes
            SET status = 'lida', data_leitura = ?
            WHERE id = ? AND status = 'nao_lida'
            RETURNING *
            "#,
        )
        .bind(when)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read(&self, usuario_id: i64, when: NaiveDateTime) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notificacoes
            SET status = 'lida', data_leitura = ?
            WHERE usuario_id = ? AND status = 'nao_lida'
            "#,
        )
        .bind(when)
        .bind(usuario_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn archive(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notificacoes
            SET status = 'arquivada'
            WHERE id = ? AND status <> 'arquivada'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notificacoes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
