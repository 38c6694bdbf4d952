// src/models/user.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};
use validator::Validate;

// Gravado como inteiro: 1 = básico, 2 = gestor, 3 = administrador
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Basico = 1,
    Gestor = 2,
    Admin = 3,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub nome: String,
    pub email: String,
    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub senha_hash: String,
    pub nivel_permissao: PermissionLevel,
    pub ativo: bool,
    pub preferencias: Option<Json<Value>>,
    pub ultima_atividade: Option<NaiveDateTime>,
    pub data_criacao: NaiveDateTime,
}

impl User {
    pub fn is_manager(&self) -> bool {
        self.nivel_permissao >= PermissionLevel::Gestor
    }
}

// Dados para cadastro de um novo usuário
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    pub nome: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: String,
    pub nivel_permissao: Option<PermissionLevel>,
}

// --- Perfil ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub usuario_id: i64,
    pub telefone: Option<String>,
    pub cargo: Option<String>,
    pub congregacao: Option<String>,
    pub bio: Option<String>,
    pub data_atualizacao: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUserProfile {
    #[validate(length(max = 30))]
    pub telefone: Option<String>,
    pub cargo: Option<String>,
    pub congregacao: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
}

// --- Configurações (chave/valor por usuário) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSetting {
    pub id: i64,
    pub usuario_id: i64,
    pub chave: String,
    pub valor: Option<String>,
}

// --- Sessão ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub usuario_id: i64,
    pub token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub data_criacao: NaiveDateTime,
    pub data_expiracao: NaiveDateTime,
    pub ativa: bool,
}

// Metadados da conexão que abriu a sessão
#[derive(Debug, Clone, Default)]
pub struct SessionOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
