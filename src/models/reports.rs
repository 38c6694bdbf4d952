// src/models/reports.rs

use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::models::fieldwork::validate_hhmm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Atendimentos,
    Territorios,
    Designacoes,
    PrediosVilas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Excel,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            other => Err(anyhow::anyhow!("Formato de exportação desconhecido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleFrequency {
    Diario,
    Semanal,
    Mensal,
}

impl ScheduleFrequency {
    /// Próxima execução a partir de uma execução anterior. No mensal o dia volta
    /// para `dia_referencia` sempre que o mês comporta (31/01 -> 28/02 -> 31/03).
    pub fn advance(self, from: NaiveDateTime, dia_referencia: u32) -> NaiveDateTime {
        match self {
            ScheduleFrequency::Diario => from + Duration::days(1),
            ScheduleFrequency::Semanal => from + Duration::days(7),
            ScheduleFrequency::Mensal => next_month_on(from, dia_referencia),
        }
    }

    /// Primeira execução: hoje no horário pedido, ou um período depois se já passou.
    pub fn first_run(self, now: NaiveDateTime, hora: NaiveTime) -> NaiveDateTime {
        let today = now.date().and_time(hora);
        if today > now { today } else { self.advance(today, today.day()) }
    }
}

// Mesmo horário, no mês seguinte, no dia pedido ou no último dia do mês
fn next_month_on(from: NaiveDateTime, dia: u32) -> NaiveDateTime {
    let inicio = from.date().with_day(1).unwrap_or(from.date());
    let Some(proximo) = inicio.checked_add_months(Months::new(1)) else {
        return from + Duration::days(30);
    };
    let dias_no_mes = proximo
        .checked_add_months(Months::new(1))
        .map(|seguinte| (seguinte - proximo).num_days() as u32)
        .unwrap_or(28);
    let dia = dia.clamp(1, dias_no_mes);
    proximo.with_day(dia).unwrap_or(proximo).and_time(from.time())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Leitura,
    Edicao,
}

// --- 1. Relatório salvo ---
// usuario_id nulo = relatório do sistema
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub id: i64,
    pub nome: String,
    pub tipo: ReportKind,
    pub descricao: Option<String>,
    pub filtros: Option<Json<Value>>,
    pub usuario_id: Option<i64>,
    pub compartilhado: bool,
    pub data_criacao: NaiveDateTime,
    pub ultima_execucao: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedReport {
    #[validate(length(min = 1, max = 120, message = "O nome do relatório é obrigatório."))]
    pub nome: String,
    pub tipo: ReportKind,
    pub descricao: Option<String>,
    pub filtros: Option<Value>,
    pub usuario_id: Option<i64>,
    #[serde(default)]
    pub compartilhado: bool,
}

// --- 2. Resultado em cache ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub id: i64,
    pub relatorio_id: i64,
    pub resultados: Json<Value>,
    pub data_geracao: NaiveDateTime,
}

// --- 3. Exportação ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport {
    pub id: i64,
    pub relatorio_id: i64,
    pub usuario_id: i64,
    pub formato: ExportFormat,
    pub caminho_arquivo: String,
    pub tamanho_bytes: Option<i64>,
    pub data_exportacao: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReportExport {
    pub relatorio_id: i64,
    pub usuario_id: i64,
    // Quando ausente usa o formato padrão da configuração
    pub formato: Option<ExportFormat>,
    #[validate(length(min = 1, message = "O caminho do arquivo é obrigatório."))]
    pub caminho_arquivo: String,
    #[validate(range(min = 0))]
    pub tamanho_bytes: Option<i64>,
}

// --- 4. Agendamento ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportSchedule {
    pub id: i64,
    pub relatorio_id: i64,
    pub usuario_id: i64,
    pub frequencia: ScheduleFrequency,
    pub hora: String,
    pub proxima_execucao: NaiveDateTime,
    pub ultima_execucao: Option<NaiveDateTime>,
    pub dia_referencia: i64,
    pub enviar_email: bool,
    pub emails_destinatarios: Option<String>,
    pub ativo: bool,
}

impl ReportSchedule {
    pub fn recipients(&self) -> Vec<&str> {
        self.emails_destinatarios
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|e| !e.is_empty()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReportSchedule {
    pub relatorio_id: i64,
    pub usuario_id: i64,
    pub frequencia: ScheduleFrequency,
    #[validate(custom(function = "validate_hhmm"))]
    pub hora: String,
    #[serde(default)]
    pub enviar_email: bool,
    #[serde(default)]
    pub emails_destinatarios: Vec<String>,
}

// --- 5. Template ---
// sistema = true: não pode ser excluído
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    pub id: i64,
    pub nome: String,
    pub tipo: ReportKind,
    pub descricao: Option<String>,
    pub filtros_padrao: Option<Json<Value>>,
    pub template: Option<String>,
    pub usuario_id: Option<i64>,
    pub sistema: bool,
    pub data_criacao: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReportTemplate {
    #[validate(length(min = 1, max = 120, message = "O nome do template é obrigatório."))]
    pub nome: String,
    pub tipo: ReportKind,
    pub descricao: Option<String>,
    pub filtros_padrao: Option<Value>,
    pub template: Option<String>,
    pub usuario_id: Option<i64>,
    #[serde(default)]
    pub sistema: bool,
}

// --- 6. Compartilhamento ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportShare {
    pub id: i64,
    pub relatorio_id: i64,
    pub usuario_id: i64,
    pub permissao: SharePermission,
    pub data_compartilhamento: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn avanca_conforme_a_frequencia() {
        let base = at(2026, 1, 31, 8, 0);
        assert_eq!(ScheduleFrequency::Diario.advance(base, 31), at(2026, 2, 1, 8, 0));
        assert_eq!(ScheduleFrequency::Semanal.advance(base, 31), at(2026, 2, 7, 8, 0));
        assert_eq!(ScheduleFrequency::Mensal.advance(base, 31), at(2026, 2, 28, 8, 0));
    }

    #[test]
    fn mensal_volta_ao_dia_de_referencia() {
        let mut proxima = at(2026, 1, 31, 8, 0);
        let mut datas = Vec::new();
        for _ in 0..4 {
            proxima = ScheduleFrequency::Mensal.advance(proxima, 31);
            datas.push(proxima);
        }
        assert_eq!(
            datas,
            vec![
                at(2026, 2, 28, 8, 0),
                at(2026, 3, 31, 8, 0),
                at(2026, 4, 30, 8, 0),
                at(2026, 5, 31, 8, 0),
            ]
        );
        // Dezembro vira o ano; fevereiro bissexto
        assert_eq!(ScheduleFrequency::Mensal.advance(at(2027, 12, 30, 6, 0), 30), at(2028, 1, 30, 6, 0));
        assert_eq!(ScheduleFrequency::Mensal.advance(at(2028, 1, 30, 6, 0), 30), at(2028, 2, 29, 6, 0));
    }

    #[test]
    fn primeira_execucao_respeita_o_horario() {
        let oito = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let cedo = at(2026, 10, 16, 7, 0);
        let tarde = at(2026, 10, 16, 9, 0);
        assert_eq!(ScheduleFrequency::Diario.first_run(cedo, oito), at(2026, 10, 16, 8, 0));
        assert_eq!(ScheduleFrequency::Semanal.first_run(tarde, oito), at(2026, 10, 23, 8, 0));
    }

    #[test]
    fn formato_de_exportacao_a_partir_do_texto() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
