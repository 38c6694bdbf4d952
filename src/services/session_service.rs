// src/services/session_service.rs

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SessionRepository, UserRepository},
    models::user::{Session, SessionOrigin},
};

#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    user_repo: UserRepository,
    timeout_minutes: i64,
    pool: sqlx::SqlitePool,
}

impl SessionService {
    pub fn new(
        session_repo: SessionRepository,
        user_repo: UserRepository,
        timeout_minutes: i64,
        pool: sqlx::SqlitePool,
    ) -> Self {
        Self { session_repo, user_repo, timeout_minutes, pool }
    }

    /// Abre uma sessão com token aleatório, válida por `SESSION_TIMEOUT_MINUTES`.
    pub async fn open(&self, usuario_id: i64, origin: SessionOrigin) -> Result<Session, AppError> {
        let user = self
            .user_repo
            .find_by_id(usuario_id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário", usuario_id))?;

        if !user.ativo {
            return Err(AppError::BusinessRule(format!("O usuário {} está inativo.", user.email)));
        }

        let now = Utc::now().naive_utc();
        let token = Uuid::new_v4().simple().to_string();
        let expira = Duration::try_minutes(self.timeout_minutes)
            .filter(|d| *d > Duration::zero())
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                anyhow::anyhow!("SESSION_TIMEOUT_MINUTES fora do intervalo: {}", self.timeout_minutes)
            })?;

        let mut tx = self.pool.begin().await?;
        let session = self
            .session_repo
            .create(&mut *tx, usuario_id, &token, &origin, expira)
            .await?;
        self.user_repo.touch(&mut *tx, usuario_id, now).await?;
        tx.commit().await?;

        tracing::info!("🔓 Sessão aberta para {}", user.email);
        Ok(session)
    }

    /// Grava uma sessão com token já definido (importação, migração de dados).
    pub async fn insert_with_token(
        &self,
        usuario_id: i64,
        token: &str,
        origin: SessionOrigin,
        expira: chrono::NaiveDateTime,
    ) -> Result<Session, AppError> {
        self.session_repo
            .create(&self.pool, usuario_id, token, &origin, expira)
            .await
    }

    // Sessão ativa e não expirada
    pub async fn find_valid(&self, token: &str) -> Result<Option<Session>, AppError> {
        self.session_repo
            .find_valid(token, Utc::now().naive_utc())
            .await
    }

    pub async fn active_sessions(&self, usuario_id: i64) -> Result<Vec<Session>, AppError> {
        self.session_repo.list_active_for_user(usuario_id).await
    }

    pub async fn close(&self, token: &str) -> Result<bool, AppError> {
        let closed = self.session_repo.close(token).await?;
        if closed {
            tracing::info!("🔒 Sessão encerrada");
        }
        Ok(closed)
    }

    pub async fn expire_stale(&self) -> Result<u64, AppError> {
        let expired = self
            .session_repo
            .expire_stale(Utc::now().naive_utc())
            .await?;
        if expired > 0 {
            tracing::info!("⌛ {} sessão(ões) expirada(s)", expired);
        }
        Ok(expired)
    }
}
