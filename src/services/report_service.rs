// src/services/report_service.rs

use chrono::{Datelike, NaiveTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::reports::{
        ExportFormat, NewReportExport, NewReportSchedule, NewReportTemplate, NewSavedReport,
        ReportExport, ReportKind, ReportResult, ReportSchedule, ReportShare, ReportTemplate,
        SavedReport, SharePermission,
    },
};

// Guarda o estado dos relatórios: definições, cache, exportações,
// agendamentos, templates e compartilhamentos. Não gera conteúdo.
#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
    max_cached: i64,
    default_format: ExportFormat,
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(
        repo: ReportRepository,
        max_cached: i64,
        default_format: ExportFormat,
        pool: SqlitePool,
    ) -> Self {
        // Pelo menos a geração recém-gravada fica no cache
        let max_cached = max_cached.max(1);
        Self { repo, max_cached, default_format, pool }
    }

    // --- Relatórios salvos ---

    pub async fn create_report(&self, payload: NewSavedReport) -> Result<SavedReport, AppError> {
        payload.validate()?;
        let report = self.repo.create(&payload).await?;
        tracing::info!("📊 Relatório salvo: {} ({:?})", report.nome, report.tipo);
        Ok(report)
    }

    pub async fn get_report(&self, id: i64) -> Result<SavedReport, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Relatório", id))
    }

    pub async fn visible_reports(&self, usuario_id: i64) -> Result<Vec<SavedReport>, AppError> {
        self.repo.list_visible(usuario_id).await
    }

    pub async fn reports_by_kind(&self, tipo: ReportKind) -> Result<Vec<SavedReport>, AppError> {
        self.repo.list_by_kind(tipo).await
    }

    pub async fn update_filters(&self, id: i64, filtros: Option<Value>) -> Result<SavedReport, AppError> {
        self.repo
            .update_filters(id, filtros.as_ref())
            .await?
            .ok_or_else(|| AppError::not_found("Relatório", id))
    }

    pub async fn delete_report(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("Relatório", id));
        }
        Ok(())
    }

    // --- Cache de resultados ---

    /// Guarda uma geração do relatório, atualiza `ultima_execucao` e descarta
    /// as gerações além de `MAX_CACHED_REPORTS`.
    pub async fn store_result(&self, relatorio_id: i64, resultados: Value) -> Result<ReportResult, AppError> {
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;
        let result = self
            .repo
            .insert_result(&mut *tx, relatorio_id, &resultados, now)
            .await?;
        self.repo.stamp_execution(&mut *tx, relatorio_id, now).await?;
        let removed = self
            .repo
            .trim_results(&mut *tx, relatorio_id, self.max_cached)
            .await?;
        tx.commit().await?;

        if removed > 0 {
            tracing::debug!("Cache do relatório {}: {} resultado(s) antigo(s) removido(s)", relatorio_id, removed);
        }
        Ok(result)
    }

    pub async fn latest_result(&self, relatorio_id: i64) -> Result<Option<ReportResult>, AppError> {
        self.repo.latest_result(relatorio_id).await
    }

    pub async fn cached_results(&self, relatorio_id: i64) -> Result<Vec<ReportResult>, AppError> {
        self.repo.list_results(relatorio_id).await
    }

    // --- Exportações ---

    pub async fn record_export(&self, payload: NewReportExport) -> Result<ReportExport, AppError> {
        payload.validate()?;
        let formato = payload.formato.unwrap_or(self.default_format);
        let export = self
            .repo
            .create_export(
                payload.relatorio_id,
                payload.usuario_id,
                formato,
                &payload.caminho_arquivo,
                payload.tamanho_bytes,
            )
            .await?;
        tracing::info!("💾 Relatório {} exportado em {:?}: {}", export.relatorio_id, formato, export.caminho_arquivo);
        Ok(export)
    }

    pub async fn exports_for_report(&self, relatorio_id: i64) -> Result<Vec<ReportExport>, AppError> {
        self.repo.list_exports_by_report(relatorio_id).await
    }

    pub async fn exports_for_user(&self, usuario_id: i64) -> Result<Vec<ReportExport>, AppError> {
        self.repo.list_exports_by_user(usuario_id).await
    }

    // --- Agendamentos ---

    pub async fn create_schedule(&self, payload: NewReportSchedule) -> Result<ReportSchedule, AppError> {
        payload.validate()?;

        let hora = NaiveTime::parse_from_str(&payload.hora, "%H:%M")
            .map_err(|e| anyhow::anyhow!("Horário inválido {}: {}", payload.hora, e))?;
        let now = Utc::now().naive_utc();
        let proxima = payload.frequencia.first_run(now, hora);
        // Referência do mensal: o dia em que o agendamento foi criado
        let dia_referencia = now.day();

        let emails = if payload.emails_destinatarios.is_empty() {
            None
        } else {
            Some(payload.emails_destinatarios.join(","))
        };

        self.repo
            .create_schedule(
                payload.relatorio_id,
                payload.usuario_id,
                payload.frequencia,
                &payload.hora,
                proxima,
                dia_referencia,
                payload.enviar_email,
                emails.as_deref(),
            )
            .await
    }

    pub async fn get_schedule(&self, id: i64) -> Result<ReportSchedule, AppError> {
        self.repo
            .find_schedule(id)
            .await?
            .ok_or_else(|| AppError::not_found("Agendamento", id))
    }

    pub async fn due_schedules(&self, now: chrono::NaiveDateTime) -> Result<Vec<ReportSchedule>, AppError> {
        self.repo.list_due_schedules(now).await
    }

    /// Registra uma execução e avança a próxima conforme a frequência.
    pub async fn mark_schedule_run(
        &self,
        id: i64,
        ran_at: chrono::NaiveDateTime,
    ) -> Result<ReportSchedule, AppError> {
        let schedule = self.get_schedule(id).await?;

        // Avança a partir da execução prevista, sem acumular atraso
        let dia = schedule.dia_referencia as u32;
        let mut proxima = schedule.frequencia.advance(schedule.proxima_execucao, dia);
        while proxima <= ran_at {
            proxima = schedule.frequencia.advance(proxima, dia);
        }

        self.repo
            .mark_schedule_run(id, ran_at, proxima)
            .await?
            .ok_or_else(|| AppError::not_found("Agendamento", id))
    }

    pub async fn deactivate_schedule(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.deactivate_schedule(id).await? {
            return Err(AppError::not_found("Agendamento", id));
        }
        Ok(())
    }

    // --- Templates ---

    pub async fn create_template(&self, payload: NewReportTemplate) -> Result<ReportTemplate, AppError> {
        payload.validate()?;
        self.repo.create_template(&payload).await
    }

    pub async fn templates(&self, tipo: ReportKind) -> Result<Vec<ReportTemplate>, AppError> {
        self.repo.list_templates(tipo).await
    }

    // Templates do sistema não podem ser excluídos
    pub async fn delete_template(&self, id: i64) -> Result<(), AppError> {
        let template = self
            .repo
            .find_template(id)
            .await?
            .ok_or_else(|| AppError::not_found("Template", id))?;

        if template.sistema {
            tracing::warn!("Tentativa de excluir o template do sistema {}", id);
            return Err(AppError::ProtectedTemplate(id));
        }

        self.repo.delete_template(id).await?;
        Ok(())
    }

    // --- Compartilhamentos ---

    pub async fn share(
        &self,
        relatorio_id: i64,
        usuario_id: i64,
        permissao: SharePermission,
    ) -> Result<ReportShare, AppError> {
        self.repo.upsert_share(relatorio_id, usuario_id, permissao).await
    }

    pub async fn revoke_share(&self, relatorio_id: i64, usuario_id: i64) -> Result<bool, AppError> {
        self.repo.revoke_share(relatorio_id, usuario_id).await
    }

    pub async fn shares(&self, relatorio_id: i64) -> Result<Vec<ReportShare>, AppError> {
        self.repo.list_shares(relatorio_id).await
    }
}
