// src/models/territory.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// --- 1. Território ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    pub id: i64,
    pub nome: String,
    pub descricao: Option<String>,
    pub ultima_visita: Option<NaiveDate>,
    pub data_criacao: NaiveDateTime,
}

// Usado tanto na criação quanto na edição
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryPayload {
    #[validate(length(min = 1, max = 120, message = "O nome do território é obrigatório."))]
    pub nome: String,
    pub descricao: Option<String>,
}

// --- 2. Rua ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Street {
    pub id: i64,
    pub territorio_id: i64,
    pub nome: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStreet {
    pub territorio_id: i64,
    #[validate(length(min = 1, max = 160, message = "O nome da rua é obrigatório."))]
    pub nome: String,
}

// --- 3. Estatísticas ---
// cobertura = imóveis distintos com atendimento / total de imóveis * 100
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryStats {
    pub territorio_id: i64,
    pub total_ruas: i64,
    pub total_imoveis: i64,
    pub total_atendimentos: i64,
    pub imoveis_visitados: i64,
    pub cobertura: f64,
}

impl TerritoryStats {
    pub fn coverage(imoveis_visitados: i64, total_imoveis: i64) -> f64 {
        if total_imoveis == 0 {
            return 0.0;
        }
        let pct = imoveis_visitados as f64 / total_imoveis as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::TerritoryStats;

    #[test]
    fn cobertura_arredonda_para_duas_casas() {
        assert_eq!(TerritoryStats::coverage(1, 3), 33.33);
        assert_eq!(TerritoryStats::coverage(2, 3), 66.67);
        assert_eq!(TerritoryStats::coverage(0, 0), 0.0);
        assert_eq!(TerritoryStats::coverage(4, 4), 100.0);
    }
}
