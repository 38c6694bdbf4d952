// src/services/territory_service.rs

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::TerritoryRepository,
    models::territory::{NewStreet, Street, Territory, TerritoryPayload, TerritoryStats},
};

#[derive(Clone)]
pub struct TerritoryService {
    repo: TerritoryRepository,
    pool: sqlx::SqlitePool,
}

impl TerritoryService {
    pub fn new(repo: TerritoryRepository, pool: sqlx::SqlitePool) -> Self {
        Self { repo, pool }
    }

    pub async fn create_territory(&self, payload: TerritoryPayload) -> Result<Territory, AppError> {
        payload.validate()?;
        let territory = self.repo.create(&self.pool, &payload).await?;
        tracing::info!("🗺️ Território criado: {} (id {})", territory.nome, territory.id);
        Ok(territory)
    }

    pub async fn get_territory(&self, id: i64) -> Result<Territory, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Território", id))
    }

    pub async fn list_territories(&self) -> Result<Vec<Territory>, AppError> {
        self.repo.list().await
    }

    pub async fn update_territory(
        &self,
        id: i64,
        payload: TerritoryPayload,
    ) -> Result<Territory, AppError> {
        payload.validate()?;
        self.repo
            .update(id, &payload)
            .await?
            .ok_or_else(|| AppError::not_found("Território", id))
    }

    pub async fn set_last_visit(&self, id: i64, data: NaiveDate) -> Result<Territory, AppError> {
        self.repo
            .set_last_visit(id, data)
            .await?
            .ok_or_else(|| AppError::not_found("Território", id))
    }

    pub async fn delete_territory(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("Território", id));
        }
        tracing::info!("🗑️ Território {} excluído (dependentes removidos em cascata)", id);
        Ok(())
    }

    pub async fn statistics(&self, id: i64) -> Result<TerritoryStats, AppError> {
        // Garante 404 em vez de estatísticas zeradas para um id inexistente
        self.get_territory(id).await?;
        self.repo.stats(id).await
    }

    // --- Ruas ---

    pub async fn add_street(&self, payload: NewStreet) -> Result<Street, AppError> {
        payload.validate()?;
        self.repo.create_street(&self.pool, &payload).await
    }

    pub async fn get_street(&self, id: i64) -> Result<Street, AppError> {
        self.repo
            .find_street(id)
            .await?
            .ok_or_else(|| AppError::not_found("Rua", id))
    }

    pub async fn list_streets(&self, territorio_id: i64) -> Result<Vec<Street>, AppError> {
        self.repo.list_streets(territorio_id).await
    }

    pub async fn delete_street(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_street(id).await? {
            return Err(AppError::not_found("Rua", id));
        }
        Ok(())
    }
}
