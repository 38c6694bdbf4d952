// src/db/building_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::building::{
        Building, BuildingDetails, BuildingKind, NewBuilding, NewUnit, NewWorkHistoryEntry, Unit,
        UpdateBuilding, WorkHistoryEntry,
    },
};

// Consulta base do imóvel com rua e território
const BUILDING_DETAILS: &str = r#"
    SELECT i.*, r.nome AS rua_nome, t.id AS territorio_id, t.nome AS territorio_nome
    FROM imoveis i
    JOIN ruas r ON r.id = i.rua_id
    JOIN territorios t ON t.id = r.territorio_id
"#;

// Imóveis, unidades e o histórico de trabalho de prédios/vilas
#[derive(Clone)]
pub struct BuildingRepository {
    pool: SqlitePool,
}

impl BuildingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &NewBuilding,
    ) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO imoveis (
                rua_id, numero, tipo, nome, total_unidades,
                tipo_portaria, tipo_acesso, observacoes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.rua_id)
        .bind(&payload.numero)
        .bind(payload.tipo)
        .bind(&payload.nome)
        .bind(payload.total_unidades)
        .bind(payload.tipo_portaria)
        .bind(payload.tipo_acesso)
        .bind(&payload.observacoes)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;

        Ok(building)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Building>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let building = sqlx::query_as::<_, Building>("SELECT * FROM imoveis WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(building)
    }

    pub async fn find_details(&self, id: i64) -> Result<Option<BuildingDetails>, AppError> {
        let sql = format!("{} WHERE i.id = ?", BUILDING_DETAILS);
        let details = sqlx::query_as::<_, BuildingDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(details)
    }

    pub async fn list_by_street(&self, rua_id: i64) -> Result<Vec<Building>, AppError> {
        // Ordena "2" antes de "10" quando o número é numérico
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT * FROM imoveis
            WHERE rua_id = ?
            ORDER BY CAST(numero AS INTEGER), numero, id
            "#,
        )
        .bind(rua_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(buildings)
    }

    pub async fn list_by_kind(&self, tipo: BuildingKind) -> Result<Vec<BuildingDetails>, AppError> {
        let sql = format!(
            "{} WHERE i.tipo = ? ORDER BY t.nome, r.nome, CAST(i.numero AS INTEGER)",
            BUILDING_DETAILS
        );
        let buildings = sqlx::query_as::<_, BuildingDetails>(&sql)
            .bind(tipo)
            .fetch_all(&self.pool)
            .await?;
        Ok(buildings)
    }

    pub async fn list_multi_unit(&self) -> Result<Vec<BuildingDetails>, AppError> {
        let sql = format!(
            "{} WHERE i.tipo IN ('predio', 'vila') ORDER BY t.nome, r.nome, CAST(i.numero AS INTEGER)",
            BUILDING_DETAILS
        );
        let buildings = sqlx::query_as::<_, BuildingDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(buildings)
    }

    pub async fn update(
        &self,
        id: i64,
        payload: &UpdateBuilding,
    ) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>(
            r#"
            UPDATE imoveis
            SET numero = ?, nome = ?, tipo_portaria = ?, tipo_acesso = ?, observacoes = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&payload.numero)
        .bind(&payload.nome)
        .bind(payload.tipo_portaria)
        .bind(payload.tipo_acesso)
        .bind(&payload.observacoes)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(building)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM imoveis WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Unidades ---

    pub async fn create_unit<'e, E>(&self, executor: E, payload: &NewUnit) -> Result<Unit, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO unidades (imovel_id, numero, observacoes)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.imovel_id)
        .bind(&payload.numero)
        .bind(&payload.observacoes)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(unit)
    }

    pub async fn find_unit<'e, E>(&self, executor: E, id: i64) -> Result<Option<Unit>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let unit = sqlx::query_as::<_, Unit>("SELECT * FROM unidades WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(unit)
    }

    pub async fn list_units(&self, imovel_id: i64) -> Result<Vec<Unit>, AppError> {
        let units = sqlx::query_as::<_, Unit>(
            "SELECT * FROM unidades WHERE imovel_id = ? ORDER BY numero, id",
        )
        .bind(imovel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    pub async fn delete_unit(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM unidades WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Histórico de trabalho ---

    pub async fn add_history(
        &self,
        payload: &NewWorkHistoryEntry,
    ) -> Result<WorkHistoryEntry, AppError> {
        let entry = sqlx::query_as::<_, WorkHistoryEntry>(
            r#"
            INSERT INTO historico_predios_vilas (imovel_id, data, descricao)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.imovel_id)
        .bind(payload.data)
        .bind(&payload.descricao)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(entry)
    }

    // Mais recente primeiro
    pub async fn list_history(&self, imovel_id: i64) -> Result<Vec<WorkHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, WorkHistoryEntry>(
            r#"
            SELECT * FROM historico_predios_vilas
            WHERE imovel_id = ?
            ORDER BY data DESC, id DESC
            "#,
        )
        .bind(imovel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
