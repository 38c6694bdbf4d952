// src/models/building.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

// Tipo do imóvel. Prédios e vilas têm unidades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Residencial,
    Comercial,
    Predio,
    Vila,
}

impl BuildingKind {
    pub fn is_multi_unit(self) -> bool {
        matches!(self, BuildingKind::Predio | BuildingKind::Vila)
    }

    // Prefixo das unidades criadas automaticamente ("Apto 01", "Casa 01")
    pub fn unit_prefix(self) -> Option<&'static str> {
        match self {
            BuildingKind::Predio => Some("Apto"),
            BuildingKind::Vila => Some("Casa"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingKind::Residencial => "residencial",
            BuildingKind::Comercial => "comercial",
            BuildingKind::Predio => "predio",
            BuildingKind::Vila => "vila",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum GatehouseKind {
    #[sqlx(rename = "24-horas")]
    #[serde(rename = "24-horas")]
    VinteQuatroHoras,
    Eletronica,
    Diurna,
    SemPortaria,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Facil,
    Restrito,
    Interfone,
    Dificil,
}

// --- 1. Imóvel ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: i64,
    pub rua_id: i64,
    pub numero: String,
    pub tipo: BuildingKind,
    pub nome: Option<String>,
    pub total_unidades: Option<i64>,
    pub tipo_portaria: Option<GatehouseKind>,
    pub tipo_acesso: Option<AccessKind>,
    pub observacoes: Option<String>,
}

// Imóvel com o endereço resolvido (rua e território)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildingDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub imovel: Building,
    pub rua_nome: String,
    pub territorio_id: i64,
    pub territorio_nome: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_unit_count"))]
pub struct NewBuilding {
    pub rua_id: i64,
    #[validate(length(min = 1, max = 20, message = "O número do imóvel é obrigatório."))]
    pub numero: String,
    pub tipo: BuildingKind,
    pub nome: Option<String>,
    #[validate(range(min = 1, max = 999, message = "Quantidade de unidades inválida."))]
    pub total_unidades: Option<i64>,
    pub tipo_portaria: Option<GatehouseKind>,
    pub tipo_acesso: Option<AccessKind>,
    pub observacoes: Option<String>,
}

// Prédio ou vila sem quantidade de unidades não pode ser cadastrado
fn validate_unit_count(payload: &NewBuilding) -> Result<(), ValidationError> {
    if payload.tipo.is_multi_unit() && payload.total_unidades.unwrap_or(0) <= 0 {
        let mut err = ValidationError::new("total_unidades");
        err.message = Some("Prédios e vilas precisam de pelo menos uma unidade.".into());
        return Err(err);
    }
    Ok(())
}

// Tipo e quantidade de unidades não mudam depois do cadastro
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuilding {
    #[validate(length(min = 1, max = 20, message = "O número do imóvel é obrigatório."))]
    pub numero: String,
    pub nome: Option<String>,
    pub tipo_portaria: Option<GatehouseKind>,
    pub tipo_acesso: Option<AccessKind>,
    pub observacoes: Option<String>,
}

// --- 2. Unidade ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: i64,
    pub imovel_id: i64,
    pub numero: String,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
    pub imovel_id: i64,
    #[validate(length(min = 1, max = 40, message = "O número da unidade é obrigatório."))]
    pub numero: String,
    pub observacoes: Option<String>,
}

// --- 3. Histórico de trabalho (prédios e vilas) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkHistoryEntry {
    pub id: i64,
    pub imovel_id: i64,
    pub data: NaiveDate,
    pub descricao: String,
    pub data_registro: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkHistoryEntry {
    pub imovel_id: i64,
    pub data: NaiveDate,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
}
