// src/models/notification.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Alerta,
    Erro,
}

// nao_lida -> lida -> arquivada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    NaoLida,
    Lida,
    Arquivada,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub usuario_id: i64,
    pub tipo: NotificationKind,
    pub titulo: String,
    pub mensagem: String,
    pub status: NotificationStatus,
    pub data_criacao: NaiveDateTime,
    pub data_leitura: Option<NaiveDateTime>,
    pub link: Option<String>,
    pub entidade: Option<String>,
    pub entidade_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub tipo: NotificationKind,
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub titulo: String,
    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub mensagem: String,
    pub link: Option<String>,
    pub entidade: Option<String>,
    pub entidade_id: Option<i64>,
}

// Designação ativa cuja devolução está próxima (território ou prédio/vila)
#[derive(Debug, Clone, FromRow)]
pub struct DueAssignment {
    pub entidade: String,
    pub entidade_id: i64,
    pub nome: String,
    pub responsavel: Option<String>,
    pub data_devolucao: NaiveDate,
}

impl DueAssignment {
    pub fn to_alert(&self) -> NewNotification {
        let responsavel = self.responsavel.as_deref().unwrap_or("sem responsável");
        NewNotification {
            tipo: NotificationKind::Alerta,
            titulo: format!("Designação próxima do vencimento: {}", self.nome),
            mensagem: format!(
                "A designação de {} ({}) deve ser devolvida em {}.",
                self.nome,
                responsavel,
                self.data_devolucao.format("%d/%m/%Y")
            ),
            link: None,
            entidade: Some(self.entidade.clone()),
            entidade_id: Some(self.entidade_id),
        }
    }
}
