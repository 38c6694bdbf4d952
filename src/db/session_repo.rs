// src/db/session_repo.rs

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::user::{Session, SessionOrigin},
};

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Token duplicado vira `AppError::SessionTokenAlreadyExists`
    pub async fn create<'e, E>(
        &self,
        executor: E,
        usuario_id: i64,
        token: &str,
        origin: &SessionOrigin,
        data_expiracao: NaiveDateTime,
    ) -> Result<Session, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessoes (usuario_id, token, ip_address, user_agent, data_expiracao)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(usuario_id)
        .bind(token)
        .bind(&origin.ip_address)
        .bind(&origin.user_agent)
        .bind(data_expiracao)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(session)
    }

    pub async fn find_valid(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessoes WHERE token = ? AND ativa = 1 AND data_expiracao > ?",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn list_active_for_user(&self, usuario_id: i64) -> Result<Vec<Session>, AppError> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessoes WHERE usuario_id = ? AND ativa = 1 ORDER BY data_criacao DESC, id DESC",
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    // Encerramento lógico: a linha continua no banco
    pub async fn close(&self, token: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE sessoes SET ativa = 0 WHERE token = ? AND ativa = 1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn expire_stale(&self, now: NaiveDateTime) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE sessoes SET ativa = 0 WHERE ativa = 1 AND data_expiracao <= ?")
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
