// src/db/outing_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::fieldwork::{NewOuting, Outing},
};

#[derive(Clone)]
pub struct OutingRepository {
    pool: SqlitePool,
}

impl OutingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &NewOuting) -> Result<Outing, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let outing = sqlx::query_as::<_, Outing>(
            r#"
            INSERT INTO saidas_campo (nome, data, dia_semana, horario, dirigente)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&payload.nome)
        .bind(payload.data)
        .bind(payload.dia_semana)
        .bind(&payload.horario)
        .bind(&payload.dirigente)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(outing)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Outing>, AppError> {
        let outing = sqlx::query_as::<_, Outing>("SELECT * FROM saidas_campo WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(outing)
    }

    // Mais recentes primeiro
    pub async fn list(&self) -> Result<Vec<Outing>, AppError> {
        let outings = sqlx::query_as::<_, Outing>(
            "SELECT * FROM saidas_campo ORDER BY data DESC, horario DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(outings)
    }

    pub async fn list_upcoming(&self, from: NaiveDate, limit: i64) -> Result<Vec<Outing>, AppError> {
        let outings = sqlx::query_as::<_, Outing>(
            r#"
            SELECT * FROM saidas_campo
            WHERE data >= ?
            ORDER BY data, horario, id
            LIMIT ?
            "#,
        )
        .bind(from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(outings)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saidas_campo")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    // Designações ligadas à saída caem em cascata
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM saidas_campo WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
