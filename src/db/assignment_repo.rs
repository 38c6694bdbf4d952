// src/db/assignment_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::{
        fieldwork::{
            Assignment, AssignmentDetails, BuildingAssignment, BuildingAssignmentDetails,
            NewAssignment, NewBuildingAssignment,
        },
        notification::DueAssignment,
    },
};

const ASSIGNMENT_DETAILS: &str = r#"
    SELECT d.*, t.nome AS territorio_nome, s.nome AS saida_nome, s.dia_semana, s.horario
    FROM designacoes d
    JOIN territorios t ON t.id = d.territorio_id
    JOIN saidas_campo s ON s.id = d.saida_campo_id
"#;

const BUILDING_ASSIGNMENT_DETAILS: &str = r#"
    SELECT d.*, i.numero AS imovel_numero, i.nome AS imovel_nome, i.tipo AS imovel_tipo,
           s.nome AS saida_nome
    FROM designacoes_predios_vilas d
    JOIN imoveis i ON i.id = d.imovel_id
    JOIN saidas_campo s ON s.id = d.saida_campo_id
"#;

// Designações de território e de prédio/vila
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &NewAssignment,
    ) -> Result<Assignment, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO designacoes (
                territorio_id, saida_campo_id, data_designacao, data_devolucao, responsavel, status
            )
            VALUES (?, ?, ?, ?, ?, 'ativo')
            RETURNING *
            "#,
        )
        .bind(payload.territorio_id)
        .bind(payload.saida_campo_id)
        .bind(payload.data_designacao)
        .bind(payload.data_devolucao)
        .bind(&payload.responsavel)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(assignment)
    }

    pub async fn find_details(&self, id: i64) -> Result<Option<AssignmentDetails>, AppError> {
        let sql = format!("{} WHERE d.id = ?", ASSIGNMENT_DETAILS);
        let details = sqlx::query_as::<_, AssignmentDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(details)
    }

    pub async fn list(&self) -> Result<Vec<AssignmentDetails>, AppError> {
        let sql = format!("{} ORDER BY d.data_designacao DESC, d.id DESC", ASSIGNMENT_DETAILS);
        let list = sqlx::query_as::<_, AssignmentDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn list_active(&self) -> Result<Vec<AssignmentDetails>, AppError> {
        let sql = format!(
            "{} WHERE d.status = 'ativo' ORDER BY d.data_designacao DESC, d.id DESC",
            ASSIGNMENT_DETAILS
        );
        let list = sqlx::query_as::<_, AssignmentDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn list_by_territory(
        &self,
        territorio_id: i64,
    ) -> Result<Vec<AssignmentDetails>, AppError> {
        let sql = format!(
            "{} WHERE d.territorio_id = ? ORDER BY d.data_designacao DESC, d.id DESC",
            ASSIGNMENT_DETAILS
        );
        let list = sqlx::query_as::<_, AssignmentDetails>(&sql)
            .bind(territorio_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(list)
    }

    /// Designação ativa que vale para o dia: começou até o dia e ainda não foi devolvida.
    pub async fn for_day(&self, dia: NaiveDate) -> Result<Option<AssignmentDetails>, AppError> {
        let sql = format!(
            r#"{}
            WHERE d.status = 'ativo'
              AND d.data_designacao <= ?1
              AND (d.data_devolucao IS NULL OR d.data_devolucao >= ?1)
            ORDER BY d.data_designacao DESC, d.id DESC
            LIMIT 1"#,
            ASSIGNMENT_DETAILS
        );
        let current = sqlx::query_as::<_, AssignmentDetails>(&sql)
            .bind(dia)
            .fetch_optional(&self.pool)
            .await?;
        Ok(current)
    }

    pub async fn close(&self, id: i64, devolucao: NaiveDate) -> Result<Option<Assignment>, AppError> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE designacoes
            SET status = 'concluido', data_devolucao = ?
            WHERE id = ? AND status = 'ativo'
            RETURNING *
            "#,
        )
        .bind(devolucao)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM designacoes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Prédios e vilas ---

    pub async fn create_for_building<'e, E>(
        &self,
        executor: E,
        payload: &NewBuildingAssignment,
    ) -> Result<BuildingAssignment, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let assignment = sqlx::query_as::<_, BuildingAssignment>(
            r#"
            INSERT INTO designacoes_predios_vilas (
                imovel_id, responsavel, saida_campo_id, data_designacao, data_devolucao, status
            )
            VALUES (?, ?, ?, ?, ?, 'ativo')
            RETURNING *
            "#,
        )
        .bind(payload.imovel_id)
        .bind(&payload.responsavel)
        .bind(payload.saida_campo_id)
        .bind(payload.data_designacao)
        .bind(payload.data_devolucao)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(assignment)
    }

    pub async fn list_active_for_buildings(
        &self,
    ) -> Result<Vec<BuildingAssignmentDetails>, AppError> {
        let sql = format!(
            "{} WHERE d.status = 'ativo' ORDER BY d.data_designacao DESC, d.id DESC",
            BUILDING_ASSIGNMENT_DETAILS
        );
        let list = sqlx::query_as::<_, BuildingAssignmentDetails>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(list)
    }

    pub async fn active_for_building(
        &self,
        imovel_id: i64,
    ) -> Result<Option<BuildingAssignmentDetails>, AppError> {
        let sql = format!(
            "{} WHERE d.imovel_id = ? AND d.status = 'ativo' ORDER BY d.data_designacao DESC, d.id DESC LIMIT 1",
            BUILDING_ASSIGNMENT_DETAILS
        );
        let current = sqlx::query_as::<_, BuildingAssignmentDetails>(&sql)
            .bind(imovel_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(current)
    }

    pub async fn close_for_building(
        &self,
        id: i64,
        devolucao: NaiveDate,
    ) -> Result<Option<BuildingAssignment>, AppError> {
        let assignment = sqlx::query_as::<_, BuildingAssignment>(
            r#"
            UPDATE designacoes_predios_vilas
            SET status = 'concluido', data_devolucao = ?
            WHERE id = ? AND status = 'ativo'
            RETURNING *
            "#,
        )
        .bind(devolucao)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    pub async fn delete_for_building(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM designacoes_predios_vilas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Alertas ---

    /// Designações ativas (território e prédio/vila) com devolução entre `from` e `until`.
    pub async fn list_due<'e, E>(
        &self,
        executor: E,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DueAssignment>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let due = sqlx::query_as::<_, DueAssignment>(
            r#"
            SELECT 'designacao' AS entidade, d.id AS entidade_id, t.nome AS nome,
                   d.responsavel AS responsavel, d.data_devolucao AS data_devolucao
            FROM designacoes d
            JOIN territorios t ON t.id = d.territorio_id
            WHERE d.status = 'ativo'
              AND d.data_devolucao IS NOT NULL
              AND d.data_devolucao BETWEEN ?1 AND ?2
            UNION ALL
            SELECT 'designacao_predios_vilas', d.id, COALESCE(i.nome, 'Imóvel ' || i.numero),
                   d.responsavel, d.data_devolucao
            FROM designacoes_predios_vilas d
            JOIN imoveis i ON i.id = d.imovel_id
            WHERE d.status = 'ativo'
              AND d.data_devolucao IS NOT NULL
              AND d.data_devolucao BETWEEN ?1 AND ?2
            ORDER BY data_devolucao, entidade_id
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(executor)
        .await?;
        Ok(due)
    }
}
