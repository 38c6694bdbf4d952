// src/db/territory_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::territory::{NewStreet, Street, Territory, TerritoryPayload, TerritoryStats},
};

// Territórios e suas ruas
#[derive(Clone)]
pub struct TerritoryRepository {
    pool: SqlitePool,
}

impl TerritoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &TerritoryPayload,
    ) -> Result<Territory, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let territory = sqlx::query_as::<_, Territory>(
            r#"
            INSERT INTO territorios (nome, descricao)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(&payload.nome)
        .bind(&payload.descricao)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;

        Ok(territory)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Territory>, AppError> {
        let territory = sqlx::query_as::<_, Territory>("SELECT * FROM territorios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(territory)
    }

    pub async fn list(&self) -> Result<Vec<Territory>, AppError> {
        let territories =
            sqlx::query_as::<_, Territory>("SELECT * FROM territorios ORDER BY nome, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(territories)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM territorios")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: &TerritoryPayload,
    ) -> Result<Option<Territory>, AppError> {
        let territory = sqlx::query_as::<_, Territory>(
            r#"
            UPDATE territorios
            SET nome = ?, descricao = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&payload.nome)
        .bind(&payload.descricao)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(territory)
    }

    pub async fn set_last_visit(&self, id: i64, data: NaiveDate) -> Result<Option<Territory>, AppError> {
        let territory = sqlx::query_as::<_, Territory>(
            "UPDATE territorios SET ultima_visita = ? WHERE id = ? RETURNING *",
        )
        .bind(data)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(territory)
    }

    /// Avança a última visita do território dono do imóvel; datas mais antigas são ignoradas.
    pub async fn advance_last_visit_for_building<'e, E>(
        &self,
        executor: E,
        imovel_id: i64,
        data: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE territorios
            SET ultima_visita = ?1
            WHERE id = (
                SELECT r.territorio_id FROM imoveis i
                JOIN ruas r ON r.id = i.rua_id
                WHERE i.id = ?2
            )
            AND (ultima_visita IS NULL OR ultima_visita < ?1)
            "#,
        )
        .bind(data)
        .bind(imovel_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Ruas, imóveis, unidades, designações e atendimentos caem em cascata
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM territorios WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Ruas ---

    pub async fn create_street<'e, E>(
        &self,
        executor: E,
        payload: &NewStreet,
    ) -> Result<Street, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let street = sqlx::query_as::<_, Street>(
            "INSERT INTO ruas (territorio_id, nome) VALUES (?, ?) RETURNING *",
        )
        .bind(payload.territorio_id)
        .bind(&payload.nome)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(street)
    }

    pub async fn find_street(&self, id: i64) -> Result<Option<Street>, AppError> {
        let street = sqlx::query_as::<_, Street>("SELECT * FROM ruas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(street)
    }

    pub async fn list_streets(&self, territorio_id: i64) -> Result<Vec<Street>, AppError> {
        let streets = sqlx::query_as::<_, Street>(
            "SELECT * FROM ruas WHERE territorio_id = ? ORDER BY nome, id",
        )
        .bind(territorio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(streets)
    }

    pub async fn delete_street(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ruas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Estatísticas ---

    pub async fn stats(&self, territorio_id: i64) -> Result<TerritoryStats, AppError> {
        let (total_ruas, total_imoveis): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ruas WHERE territorio_id = ?1),
                (SELECT COUNT(*) FROM imoveis i
                   JOIN ruas r ON r.id = i.rua_id
                  WHERE r.territorio_id = ?1)
            "#,
        )
        .bind(territorio_id)
        .fetch_one(&self.pool)
        .await?;

        let (total_atendimentos, imoveis_visitados): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(a.id), COUNT(DISTINCT a.imovel_id)
            FROM atendimentos a
            JOIN imoveis i ON i.id = a.imovel_id
            JOIN ruas r ON r.id = i.rua_id
            WHERE r.territorio_id = ?
            "#,
        )
        .bind(territorio_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TerritoryStats {
            territorio_id,
            total_ruas,
            total_imoveis,
            total_atendimentos,
            imoveis_visitados,
            cobertura: TerritoryStats::coverage(imoveis_visitados, total_imoveis),
        })
    }
}
