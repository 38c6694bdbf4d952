// src/db/activity_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::activity::{ActivityLogDetails, ActivityLogEntry, NewActivity},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &NewActivity,
    ) -> Result<ActivityLogEntry, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let entry = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            INSERT INTO log_atividades (usuario_id, tipo_acao, descricao, entidade, entidade_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.usuario_id)
        .bind(payload.tipo_acao)
        .bind(&payload.descricao)
        .bind(&payload.entidade)
        .bind(payload.entidade_id)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(entry)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogDetails>, AppError> {
        let entries = sqlx::query_as::<_, ActivityLogDetails>(
            r#"
            SELECT l.*, u.nome AS usuario_nome
            FROM log_atividades l
            JOIN usuarios u ON u.id = l.usuario_id
            ORDER BY l.data_hora DESC, l.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn list_by_user(
        &self,
        usuario_id: i64,
        limit: i64,
    ) -> Result<Vec<ActivityLogEntry>, AppError> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT * FROM log_atividades
            WHERE usuario_id = ?
            ORDER BY data_hora DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(usuario_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn list_by_entity(
        &self,
        entidade: &str,
        entidade_id: i64,
    ) -> Result<Vec<ActivityLogDetails>, AppError> {
        let entries = sqlx::query_as::<_, ActivityLogDetails>(
            r#"
            SELECT l.*, u.nome AS usuario_nome
            FROM log_atividades l
            JOIN usuarios u ON u.id = l.usuario_id
            WHERE l.entidade = ? AND l.entidade_id = ?
            ORDER BY l.data_hora DESC, l.id DESC
            "#,
        )
        .bind(entidade)
        .bind(entidade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
