// src/models/visit.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum VisitResult {
    Positivo,
    OcupanteAusente,
    RecusouAtendimento,
    ApenasVisitado,
}

// --- Atendimento ---
// unidade_id nulo = atendimento no imóvel como um todo
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub imovel_id: i64,
    pub unidade_id: Option<i64>,
    pub data: NaiveDate,
    pub resultado: Option<VisitResult>,
    pub observacoes: Option<String>,
    pub data_registro: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub atendimento: Visit,
    pub imovel_numero: String,
    pub unidade_numero: Option<String>,
    pub rua_nome: String,
    pub territorio_nome: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVisit {
    pub imovel_id: i64,
    pub unidade_id: Option<i64>,
    pub data: NaiveDate,
    pub resultado: Option<VisitResult>,
    #[validate(length(max = 2000, message = "Observações muito longas."))]
    pub observacoes: Option<String>,
}

// Linha de agregação: "chave" é o resultado, o tipo do imóvel ou o território
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct CountBy {
    pub chave: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStats {
    pub total: i64,
    pub por_resultado: Vec<CountBy>,
    pub por_tipo_imovel: Vec<CountBy>,
    pub por_territorio: Vec<CountBy>,
}

impl VisitStats {
    pub fn count_for(list: &[CountBy], chave: &str) -> i64 {
        list.iter()
            .find(|c| c.chave == chave)
            .map(|c| c.total)
            .unwrap_or(0)
    }
}
