// src/db/user_repo.rs

use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::{Executor, Sqlite, SqlitePool, types::Json};

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::user::{NewUserProfile, PermissionLevel, User, UserProfile, UserSetting},
};

// O repositório de usuários: contas, perfis e configurações
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // E-mail duplicado vira `AppError::EmailAlreadyExists` em `map_db_error`
    pub async fn create<'e, E>(
        &self,
        executor: E,
        nome: &str,
        email: &str,
        senha_hash: &str,
        nivel_permissao: PermissionLevel,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO usuarios (nome, email, senha_hash, nivel_permissao)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(nome)
        .bind(email)
        .bind(senha_hash)
        .bind(nivel_permissao)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM usuarios ORDER BY nome, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn list_active(&self) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE ativo = 1 ORDER BY nome, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    pub async fn list_active_ids<'e, E>(
        &self,
        executor: E,
        min_level: PermissionLevel,
    ) -> Result<Vec<i64>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM usuarios WHERE ativo = 1 AND nivel_permissao >= ? ORDER BY id",
        )
        .bind(min_level)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
            .fetch_one(executor)
            .await?;
        Ok(total)
    }

    pub async fn set_permission(
        &self,
        id: i64,
        nivel: PermissionLevel,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE usuarios SET nivel_permissao = ? WHERE id = ? RETURNING *",
        )
        .bind(nivel)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(user)
    }

    pub async fn set_active(&self, id: i64, ativo: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("UPDATE usuarios SET ativo = ? WHERE id = ? RETURNING *")
            .bind(ativo)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn set_preferences(&self, id: i64, preferencias: &Value) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE usuarios SET preferencias = ? WHERE id = ? RETURNING *",
        )
        .bind(Json(preferencias))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn touch<'e, E>(&self, executor: E, id: i64, when: NaiveDateTime) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE usuarios SET ultima_atividade = ? WHERE id = ?")
            .bind(when)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Sessões, notificações, log, perfis, configurações e relatórios próprios caem em cascata
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Perfis ---

    pub async fn add_profile(
        &self,
        usuario_id: i64,
        payload: &NewUserProfile,
    ) -> Result<UserProfile, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO perfis_usuario (usuario_id, telefone, cargo, congregacao, bio)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(usuario_id)
        .bind(&payload.telefone)
        .bind(&payload.cargo)
        .bind(&payload.congregacao)
        .bind(&payload.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(profile)
    }

    pub async fn list_profiles(&self, usuario_id: i64) -> Result<Vec<UserProfile>, AppError> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM perfis_usuario WHERE usuario_id = ? ORDER BY data_atualizacao DESC, id DESC",
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    // --- Configurações ---

    pub async fn upsert_setting(
        &self,
        usuario_id: i64,
        chave: &str,
        valor: Option<&str>,
    ) -> Result<UserSetting, AppError> {
        let setting = sqlx::query_as::<_, UserSetting>(
            r#"
            INSERT INTO configuracoes_usuario (usuario_id, chave, valor)
            VALUES (?, ?, ?)
            ON CONFLICT (usuario_id, chave)
            DO UPDATE SET valor = excluded.valor
            RETURNING *
            "#,
        )
        .bind(usuario_id)
        .bind(chave)
        .bind(valor)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(setting)
    }

    pub async fn find_setting(
        &self,
        usuario_id: i64,
        chave: &str,
    ) -> Result<Option<UserSetting>, AppError> {
        let setting = sqlx::query_as::<_, UserSetting>(
            "SELECT * FROM configuracoes_usuario WHERE usuario_id = ? AND chave = ?",
        )
        .bind(usuario_id)
        .bind(chave)
        .fetch_optional(&self.pool)
        .await?;
        Ok(setting)
    }

    pub async fn list_settings(&self, usuario_id: i64) -> Result<Vec<UserSetting>, AppError> {
        let settings = sqlx::query_as::<_, UserSetting>(
            "SELECT * FROM configuracoes_usuario WHERE usuario_id = ? ORDER BY chave",
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(settings)
    }
}
