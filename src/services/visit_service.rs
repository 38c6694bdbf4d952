// src/services/visit_service.rs

use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, TerritoryRepository, VisitRepository},
    models::visit::{NewVisit, Visit, VisitDetails, VisitStats},
};

#[derive(Clone)]
pub struct VisitService {
    visit_repo: VisitRepository,
    building_repo: BuildingRepository,
    territory_repo: TerritoryRepository,
    pool: SqlitePool,
}

impl VisitService {
    pub fn new(
        visit_repo: VisitRepository,
        building_repo: BuildingRepository,
        territory_repo: TerritoryRepository,
        pool: SqlitePool,
    ) -> Self {
        Self { visit_repo, building_repo, territory_repo, pool }
    }

    /// Registra um atendimento. A unidade, quando informada, precisa ser do mesmo imóvel;
    /// o banco também garante isso pela chave composta (unidade_id, imovel_id).
    pub async fn record_visit(&self, payload: NewVisit) -> Result<Visit, AppError> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        self.building_repo
            .find_by_id(&mut *tx, payload.imovel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Imóvel", payload.imovel_id))?;

        if let Some(unidade_id) = payload.unidade_id {
            let unit = self
                .building_repo
                .find_unit(&mut *tx, unidade_id)
                .await?
                .ok_or_else(|| AppError::not_found("Unidade", unidade_id))?;

            if unit.imovel_id != payload.imovel_id {
                tracing::warn!(
                    "Atendimento recusado: unidade {} é do imóvel {}, não do {}",
                    unidade_id,
                    unit.imovel_id,
                    payload.imovel_id
                );
                return Err(AppError::UnitOutsideBuilding {
                    unidade_id,
                    imovel_id: payload.imovel_id,
                });
            }
        }

        let visit = self.visit_repo.create(&mut *tx, &payload).await?;

        self.territory_repo
            .advance_last_visit_for_building(&mut *tx, payload.imovel_id, payload.data)
            .await?;

        tx.commit().await?;

        tracing::debug!("Atendimento {} registrado no imóvel {}", visit.id, visit.imovel_id);
        Ok(visit)
    }

    pub async fn get_visit(&self, id: i64) -> Result<Visit, AppError> {
        self.visit_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Atendimento", id))
    }

    pub async fn visits_for_building(&self, imovel_id: i64) -> Result<Vec<VisitDetails>, AppError> {
        self.visit_repo.list_by_building(imovel_id).await
    }

    pub async fn visits_for_unit(&self, unidade_id: i64) -> Result<Vec<VisitDetails>, AppError> {
        self.visit_repo.list_by_unit(unidade_id).await
    }

    pub async fn latest_visits(&self, limit: i64) -> Result<Vec<VisitDetails>, AppError> {
        self.visit_repo.latest(limit).await
    }

    pub async fn statistics(&self) -> Result<VisitStats, AppError> {
        self.visit_repo.stats().await
    }

    pub async fn delete_visit(&self, id: i64) -> Result<(), AppError> {
        if !self.visit_repo.delete(id).await? {
            return Err(AppError::not_found("Atendimento", id));
        }
        Ok(())
    }
}
