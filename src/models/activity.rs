// src/models/activity.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Login,
    Logout,
    Criar,
    Editar,
    Excluir,
    Visualizar,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub usuario_id: i64,
    pub tipo_acao: ActionKind,
    pub descricao: String,
    pub data_hora: NaiveDateTime,
    pub entidade: Option<String>,
    pub entidade_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registro: ActivityLogEntry,
    pub usuario_nome: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub usuario_id: i64,
    pub tipo_acao: ActionKind,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub entidade: Option<String>,
    pub entidade_id: Option<i64>,
}
