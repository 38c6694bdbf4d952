// src/models/schema.rs

use serde::Serialize;

// Resultado da comparação entre o banco aberto e o catálogo esperado
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    pub missing_tables: Vec<String>,
    // "tabela.coluna"
    pub missing_columns: Vec<String>,
    pub missing_indexes: Vec<String>,
}

impl SchemaReport {
    pub fn is_valid(&self) -> bool {
        self.missing_tables.is_empty()
            && self.missing_columns.is_empty()
            && self.missing_indexes.is_empty()
    }
}

// Resumo do que a preparação inicial inseriu
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub admin_created: bool,
    pub sample_territory_id: Option<i64>,
    pub outings_created: usize,
}
