// src/db/report_repo.rs

use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool, types::Json};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::reports::{
        ExportFormat, NewReportTemplate, NewSavedReport, ReportExport, ReportKind, ReportResult,
        ReportSchedule, ReportShare, ReportTemplate, SavedReport, ScheduleFrequency,
        SharePermission,
    },
};

// Relatórios salvos e tudo que depende deles
#[derive(Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // --- 1. Relatórios salvos ---

    pub async fn create(&self, payload: &NewSavedReport) -> Result<SavedReport, AppError> {
        let report = sqlx::query_as::<_, SavedReport>(
            r#"
            INSERT INTO relatorios (nome, tipo, descricao, filtros, usuario_id, compartilhado)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&payload.nome)
        .bind(payload.tipo)
        .bind(&payload.descricao)
        .bind(payload.filtros.as_ref().map(Json))
        .bind(payload.usuario_id)
        .bind(payload.compartilhado)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(report)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<SavedReport>, AppError> {
        let report = sqlx::query_as::<_, SavedReport>("SELECT * FROM relatorios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    /// Próprios, do sistema, marcados como compartilhados ou compartilhados com o usuário.
    pub async fn list_visible(&self, usuario_id: i64) -> Result<Vec<SavedReport>, AppError> {
        let reports = sqlx::query_as::<_, SavedReport>(
            r#"
            SELECT * FROM relatorios
            WHERE usuario_id = ?1
               OR usuario_id IS NULL
               OR compartilhado = 1
               OR id IN (
                   SELECT relatorio_id FROM relatorio_compartilhamentos WHERE usuario_id = ?1
               )
            ORDER BY nome, id
            "#,
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn list_by_kind(&self, tipo: ReportKind) -> Result<Vec<SavedReport>, AppError> {
        let reports =
            sqlx::query_as::<_, SavedReport>("SELECT * FROM relatorios WHERE tipo = ? ORDER BY nome, id")
                .bind(tipo)
                .fetch_all(&self.pool)
                .await?;
        Ok(reports)
    }

    pub async fn update_filters(
        &self,
        id: i64,
        filtros: Option<&Value>,
    ) -> Result<Option<SavedReport>, AppError> {
        let report = sqlx::query_as::<_, SavedReport>(
            "UPDATE relatorios SET filtros = ? WHERE id = ? RETURNING *",
        )
        .bind(filtros.map(Json))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM relatorios WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- 2. Resultados em cache ---

    pub async fn insert_result<'e, E>(
        &self,
        executor: E,
        relatorio_id: i64,
        resultados: &Value,
        gerado_em: NaiveDateTime,
    ) -> Result<ReportResult, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query_as::<_, ReportResult>(
            r#"
            INSERT INTO relatorio_resultados (relatorio_id, resultados, data_geracao)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(relatorio_id)
        .bind(Json(resultados))
        .bind(gerado_em)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;
        Ok(result)
    }

    pub async fn stamp_execution<'e, E>(
        &self,
        executor: E,
        relatorio_id: i64,
        when: NaiveDateTime,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE relatorios SET ultima_execucao = ? WHERE id = ?")
            .bind(when)
            .bind(relatorio_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Mantém só os `keep` resultados mais novos do relatório
    pub async fn trim_results<'e, E>(
        &self,
        executor: E,
        relatorio_id: i64,
        keep: i64,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM relatorio_resultados
            WHERE relatorio_id = ?1
              AND id NOT IN (
                  SELECT id FROM relatorio_resultados
                  WHERE relatorio_id = ?1
                  ORDER BY id DESC
                  LIMIT ?2
              )
            "#,
        )
        .bind(relatorio_id)
        .bind(keep)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn latest_result(&self, relatorio_id: i64) -> Result<Option<ReportResult>, AppError> {
        let result = sqlx::query_as::<_, ReportResult>(
            r#"
            SELECT * FROM relatorio_resultados
            WHERE relatorio_id = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(relatorio_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(result)
    }

    pub async fn list_results(&self, relatorio_id: i64) -> Result<Vec<ReportResult>, AppError> {
        let results = sqlx::query_as::<_, ReportResult>(
            "SELECT * FROM relatorio_resultados WHERE relatorio_id = ? ORDER BY id DESC",
        )
        .bind(relatorio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(results)
    }

    // --- 3. Exportações ---

    pub async fn create_export(
        &self,
        relatorio_id: i64,
        usuario_id: i64,
        formato: ExportFormat,
        caminho_arquivo: &str,
        tamanho_bytes: Option<i64>,
    ) -> Result<ReportExport, AppError> {
        let export = sqlx::query_as::<_, ReportExport>(
            r#"
            INSERT INTO relatorio_exportacoes (
                relatorio_id, usuario_id, formato, caminho_arquivo, tamanho_bytes
            )
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(relatorio_id)
        .bind(usuario_id)
        .bind(formato)
        .bind(caminho_arquivo)
        .bind(tamanho_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(export)
    }

    pub async fn list_exports_by_report(
        &self,
        relatorio_id: i64,
    ) -> Result<Vec<ReportExport>, AppError> {
        let exports = sqlx::query_as::<_, ReportExport>(
            "SELECT * FROM relatorio_exportacoes WHERE relatorio_id = ? ORDER BY id DESC",
        )
        .bind(relatorio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exports)
    }

    pub async fn list_exports_by_user(&self, usuario_id: i64) -> Result<Vec<ReportExport>, AppError> {
        let exports = sqlx::query_as::<_, ReportExport>(
            "SELECT * FROM relatorio_exportacoes WHERE usuario_id = ? ORDER BY id DESC",
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exports)
    }

    // --- 4. Agendamentos ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_schedule(
        &self,
        relatorio_id: i64,
        usuario_id: i64,
        frequencia: ScheduleFrequency,
        hora: &str,
        proxima_execucao: NaiveDateTime,
        dia_referencia: u32,
        enviar_email: bool,
        emails_destinatarios: Option<&str>,
    ) -> Result<ReportSchedule, AppError> {
        let schedule = sqlx::query_as::<_, ReportSchedule>(
            r#"
            INSERT INTO relatorio_agendamentos (
                relatorio_id, usuario_id, frequencia, hora, proxima_execucao,
                dia_referencia, enviar_email, emails_destinatarios
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(relatorio_id)
        .bind(usuario_id)
        .bind(frequencia)
        .bind(hora)
        .bind(proxima_execucao)
        .bind(dia_referencia)
        .bind(enviar_email)
        .bind(emails_destinatarios)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(schedule)
    }

    pub async fn find_schedule(&self, id: i64) -> Result<Option<ReportSchedule>, AppError> {
        let schedule =
            sqlx::query_as::<_, ReportSchedule>("SELECT * FROM relatorio_agendamentos WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(schedule)
    }

    pub async fn list_due_schedules(&self, now: NaiveDateTime) -> Result<Vec<ReportSchedule>, AppError> {
        let schedules = sqlx::query_as::<_, ReportSchedule>(
            r#"
            SELECT * FROM relatorio_agendamentos
            WHERE ativo = 1 AND proxima_execucao <= ?
            ORDER BY proxima_execucao, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    pub async fn mark_schedule_run(
        &self,
        id: i64,
        ran_at: NaiveDateTime,
        proxima_execucao: NaiveDateTime,
    ) -> Result<Option<ReportSchedule>, AppError> {
        let schedule = sqlx::query_as::<_, ReportSchedule>(
            r#"
            UPDATE relatorio_agendamentos
            SET ultima_execucao = ?, proxima_execucao = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(ran_at)
        .bind(proxima_execucao)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(schedule)
    }

    pub async fn deactivate_schedule(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE relatorio_agendamentos SET ativo = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- 5. Templates ---

    pub async fn create_template(&self, payload: &NewReportTemplate) -> Result<ReportTemplate, AppError> {
        let template = sqlx::query_as::<_, ReportTemplate>(
            r#"
            INSERT INTO relatorio_templates (
                nome, tipo, descricao, filtros_padrao, template, usuario_id, sistema
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&payload.nome)
        .bind(payload.tipo)
        .bind(&payload.descricao)
        .bind(payload.filtros_padrao.as_ref().map(Json))
        .bind(&payload.template)
        .bind(payload.usuario_id)
        .bind(payload.sistema)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(template)
    }

    pub async fn find_template(&self, id: i64) -> Result<Option<ReportTemplate>, AppError> {
        let template =
            sqlx::query_as::<_, ReportTemplate>("SELECT * FROM relatorio_templates WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(template)
    }

    // Templates do sistema primeiro
    pub async fn list_templates(&self, tipo: ReportKind) -> Result<Vec<ReportTemplate>, AppError> {
        let templates = sqlx::query_as::<_, ReportTemplate>(
            "SELECT * FROM relatorio_templates WHERE tipo = ? ORDER BY sistema DESC, nome, id",
        )
        .bind(tipo)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM relatorio_templates WHERE id = ? AND sistema = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- 6. Compartilhamentos ---

    pub async fn upsert_share(
        &self,
        relatorio_id: i64,
        usuario_id: i64,
        permissao: SharePermission,
    ) -> Result<ReportShare, AppError> {
        let share = sqlx::query_as::<_, ReportShare>(
            r#"
            INSERT INTO relatorio_compartilhamentos (relatorio_id, usuario_id, permissao)
            VALUES (?, ?, ?)
            ON CONFLICT (relatorio_id, usuario_id)
            DO UPDATE SET permissao = excluded.permissao
            RETURNING *
            "#,
        )
        .bind(relatorio_id)
        .bind(usuario_id)
        .bind(permissao)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(share)
    }

    pub async fn revoke_share(&self, relatorio_id: i64, usuario_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM relatorio_compartilhamentos WHERE relatorio_id = ? AND usuario_id = ?",
        )
        .bind(relatorio_id)
        .bind(usuario_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_shares(&self, relatorio_id: i64) -> Result<Vec<ReportShare>, AppError> {
        let shares = sqlx::query_as::<_, ReportShare>(
            "SELECT * FROM relatorio_compartilhamentos WHERE relatorio_id = ? ORDER BY usuario_id",
        )
        .bind(relatorio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shares)
    }
}
