// src/services/user_service.rs

use bcrypt::hash;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::user::{NewUser, NewUserProfile, PermissionLevel, User, UserProfile, UserSetting},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    bcrypt_cost: u32,
    pool: SqlitePool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, bcrypt_cost: u32, pool: SqlitePool) -> Self {
        Self { user_repo, bcrypt_cost, pool }
    }

    pub async fn create_user(&self, payload: NewUser) -> Result<User, AppError> {
        payload.validate()?;

        // Hashing fora do runtime assíncrono
        let senha = payload.senha.clone();
        let cost = self.bcrypt_cost;
        let senha_hash = tokio::task::spawn_blocking(move || hash(&senha, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let nivel = payload.nivel_permissao.unwrap_or(PermissionLevel::Basico);
        let user = self
            .user_repo
            .create(&self.pool, &payload.nome, &payload.email, &senha_hash, nivel)
            .await?;

        tracing::info!("👤 Usuário criado: {} ({:?})", user.email, user.nivel_permissao);
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário", id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.user_repo.find_by_email(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn list_active_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_active().await
    }

    pub async fn change_permission(&self, id: i64, nivel: PermissionLevel) -> Result<User, AppError> {
        let user = self
            .user_repo
            .set_permission(id, nivel)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário", id))?;
        tracing::info!("🔑 Permissão de {} alterada para {:?}", user.email, nivel);
        Ok(user)
    }

    pub async fn set_active(&self, id: i64, ativo: bool) -> Result<User, AppError> {
        self.user_repo
            .set_active(id, ativo)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário", id))
    }

    pub async fn update_preferences(&self, id: i64, preferencias: Value) -> Result<User, AppError> {
        if !preferencias.is_object() {
            return Err(AppError::BusinessRule(
                "As preferências devem ser um objeto JSON.".to_string(),
            ));
        }
        self.user_repo
            .set_preferences(id, &preferencias)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário", id))
    }

    pub async fn touch(&self, id: i64) -> Result<(), AppError> {
        self.user_repo
            .touch(&self.pool, id, Utc::now().naive_utc())
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        if !self.user_repo.delete(id).await? {
            return Err(AppError::not_found("Usuário", id));
        }
        tracing::info!("🗑️ Usuário {} excluído", id);
        Ok(())
    }

    // --- Perfis e configurações ---

    pub async fn add_profile(
        &self,
        usuario_id: i64,
        payload: NewUserProfile,
    ) -> Result<UserProfile, AppError> {
        payload.validate()?;
        self.user_repo.add_profile(usuario_id, &payload).await
    }

    pub async fn profiles(&self, usuario_id: i64) -> Result<Vec<UserProfile>, AppError> {
        self.user_repo.list_profiles(usuario_id).await
    }

    pub async fn set_setting(
        &self,
        usuario_id: i64,
        chave: &str,
        valor: Option<&str>,
    ) -> Result<UserSetting, AppError> {
        if chave.trim().is_empty() {
            return Err(AppError::BusinessRule("A chave da configuração é obrigatória.".to_string()));
        }
        self.user_repo.upsert_setting(usuario_id, chave, valor).await
    }

    pub async fn setting(&self, usuario_id: i64, chave: &str) -> Result<Option<UserSetting>, AppError> {
        self.user_repo.find_setting(usuario_id, chave).await
    }

    pub async fn settings(&self, usuario_id: i64) -> Result<Vec<UserSetting>, AppError> {
        self.user_repo.list_settings(usuario_id).await
    }
}
