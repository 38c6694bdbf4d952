// src/db/visit_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::visit::{CountBy, NewVisit, Visit, VisitDetails, VisitStats},
};

const VISIT_DETAILS: &str = r#"
    SELECT a.*, i.numero AS imovel_numero, u.numero AS unidade_numero,
           r.nome AS rua_nome, t.nome AS territorio_nome
    FROM atendimentos a
    JOIN imoveis i ON i.id = a.imovel_id
    LEFT JOIN unidades u ON u.id = a.unidade_id
    JOIN ruas r ON r.id = i.rua_id
    JOIN territorios t ON t.id = r.territorio_id
"#;

// Atendimentos (registros de visita)
#[derive(Clone)]
pub struct VisitRepository {
    pool: SqlitePool,
}

impl VisitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &NewVisit) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO atendimentos (imovel_id, unidade_id, data, resultado, observacoes)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(payload.imovel_id)
        .bind(payload.unidade_id)
        .bind(payload.data)
        .bind(payload.resultado)
        .bind(&payload.observacoes)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(visit)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Visit>, AppError> {
        let visit = sqlx::query_as::<_, Visit>("SELECT * FROM atendimentos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(visit)
    }

    pub async fn list_by_building(&self, imovel_id: i64) -> Result<Vec<VisitDetails>, AppError> {
        let sql = format!("{} WHERE a.imovel_id = ? ORDER BY a.data DESC, a.id DESC", VISIT_DETAILS);
        let visits = sqlx::query_as::<_, VisitDetails>(&sql)
            .bind(imovel_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(visits)
    }

    pub async fn list_by_unit(&self, unidade_id: i64) -> Result<Vec<VisitDetails>, AppError> {
        let sql = format!("{} WHERE a.unidade_id = ? ORDER BY a.data DESC, a.id DESC", VISIT_DETAILS);
        let visits = sqlx::query_as::<_, VisitDetails>(&sql)
            .bind(unidade_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(visits)
    }

    pub async fn latest(&self, limit: i64) -> Result<Vec<VisitDetails>, AppError> {
        let sql = format!("{} ORDER BY a.data DESC, a.id DESC LIMIT ?", VISIT_DETAILS);
        let visits = sqlx::query_as::<_, VisitDetails>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(visits)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM atendimentos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&self) -> Result<VisitStats, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM atendimentos")
            .fetch_one(&self.pool)
            .await?;

        let por_resultado = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT COALESCE(resultado, 'sem-resultado') AS chave, COUNT(*) AS total
            FROM atendimentos
            GROUP BY chave
            ORDER BY total DESC, chave
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let por_tipo_imovel = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT i.tipo AS chave, COUNT(*) AS total
            FROM atendimentos a
            JOIN imoveis i ON i.id = a.imovel_id
            GROUP BY i.tipo
            ORDER BY total DESC, chave
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let por_territorio = sqlx::query_as::<_, CountBy>(
            r#"
            SELECT t.nome AS chave, COUNT(*) AS total
            FROM atendimentos a
            JOIN imoveis i ON i.id = a.imovel_id
            JOIN ruas r ON r.id = i.rua_id
            JOIN territorios t ON t.id = r.territorio_id
            GROUP BY t.id
            ORDER BY total DESC, chave
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(VisitStats {
            total,
            por_resultado,
            por_tipo_imovel,
            por_territorio,
        })
    }
}
