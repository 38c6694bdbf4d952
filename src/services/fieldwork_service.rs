// src/services/fieldwork_service.rs

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{AssignmentRepository, BuildingRepository, OutingRepository},
    models::fieldwork::{
        Assignment, AssignmentDetails, BuildingAssignment, BuildingAssignmentDetails,
        NewAssignment, NewBuildingAssignment, NewOuting, Outing,
    },
};

// Saídas de campo e designações (de território e de prédio/vila)
#[derive(Clone)]
pub struct FieldworkService {
    outing_repo: OutingRepository,
    assignment_repo: AssignmentRepository,
    building_repo: BuildingRepository,
    pool: sqlx::SqlitePool,
}

impl FieldworkService {
    pub fn new(
        outing_repo: OutingRepository,
        assignment_repo: AssignmentRepository,
        building_repo: BuildingRepository,
        pool: sqlx::SqlitePool,
    ) -> Self {
        Self { outing_repo, assignment_repo, building_repo, pool }
    }

    // --- Saídas de campo ---

    pub async fn create_outing(&self, payload: NewOuting) -> Result<Outing, AppError> {
        payload.validate()?;
        let outing = self.outing_repo.create(&self.pool, &payload).await?;
        tracing::info!("📅 Saída de campo criada: {} em {}", outing.nome, outing.data);
        Ok(outing)
    }

    pub async fn get_outing(&self, id: i64) -> Result<Outing, AppError> {
        self.outing_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Saída de campo", id))
    }

    pub async fn list_outings(&self) -> Result<Vec<Outing>, AppError> {
        self.outing_repo.list().await
    }

    pub async fn upcoming_outings(&self, from: NaiveDate, limit: i64) -> Result<Vec<Outing>, AppError> {
        self.outing_repo.list_upcoming(from, limit).await
    }

    pub async fn delete_outing(&self, id: i64) -> Result<(), AppError> {
        if !self.outing_repo.delete(id).await? {
            return Err(AppError::not_found("Saída de campo", id));
        }
        Ok(())
    }

    // --- Designações de território ---

    pub async fn assign_territory(&self, payload: NewAssignment) -> Result<Assignment, AppError> {
        payload.validate()?;
        let assignment = self.assignment_repo.create(&self.pool, &payload).await?;
        tracing::info!(
            "📌 Território {} designado para a saída {}",
            assignment.territorio_id,
            assignment.saida_campo_id
        );
        Ok(assignment)
    }

    pub async fn get_assignment(&self, id: i64) -> Result<AssignmentDetails, AppError> {
        self.assignment_repo
            .find_details(id)
            .await?
            .ok_or_else(|| AppError::not_found("Designação", id))
    }

    pub async fn list_assignments(&self) -> Result<Vec<AssignmentDetails>, AppError> {
        self.assignment_repo.list().await
    }

    pub async fn active_assignments(&self) -> Result<Vec<AssignmentDetails>, AppError> {
        self.assignment_repo.list_active().await
    }

    pub async fn assignments_for_territory(
        &self,
        territorio_id: i64,
    ) -> Result<Vec<AssignmentDetails>, AppError> {
        self.assignment_repo.list_by_territory(territorio_id).await
    }

    pub async fn assignment_of_the_day(
        &self,
        dia: NaiveDate,
    ) -> Result<Option<AssignmentDetails>, AppError> {
        self.assignment_repo.for_day(dia).await
    }

    /// Conclui a designação e grava a data de devolução.
    pub async fn close_assignment(&self, id: i64, devolucao: NaiveDate) -> Result<Assignment, AppError> {
        match self.assignment_repo.close(id, devolucao).await? {
            Some(assignment) => {
                tracing::info!("✅ Designação {} concluída em {}", id, devolucao);
                Ok(assignment)
            }
            None => {
                // Distingue "não existe" de "já estava concluída"
                self.get_assignment(id).await?;
                Err(AppError::BusinessRule(format!("A designação {} já foi concluída.", id)))
            }
        }
    }

    pub async fn delete_assignment(&self, id: i64) -> Result<(), AppError> {
        if !self.assignment_repo.delete(id).await? {
            return Err(AppError::not_found("Designação", id));
        }
        Ok(())
    }

    // --- Designações de prédio/vila ---

    pub async fn assign_building(
        &self,
        payload: NewBuildingAssignment,
    ) -> Result<BuildingAssignment, AppError> {
        payload.validate()?;

        let imovel = self
            .building_repo
            .find_by_id(&self.pool, payload.imovel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Imóvel", payload.imovel_id))?;

        if !imovel.tipo.is_multi_unit() {
            return Err(AppError::BusinessRule(
                "Somente prédios e vilas recebem designação própria.".to_string(),
            ));
        }

        self.assignment_repo.create_for_building(&self.pool, &payload).await
    }

    pub async fn active_building_assignments(
        &self,
    ) -> Result<Vec<BuildingAssignmentDetails>, AppError> {
        self.assignment_repo.list_active_for_buildings().await
    }

    pub async fn active_assignment_for_building(
        &self,
        imovel_id: i64,
    ) -> Result<Option<BuildingAssignmentDetails>, AppError> {
        self.assignment_repo.active_for_building(imovel_id).await
    }

    pub async fn close_building_assignment(
        &self,
        id: i64,
        devolucao: NaiveDate,
    ) -> Result<BuildingAssignment, AppError> {
        self.assignment_repo
            .close_for_building(id, devolucao)
            .await?
            .ok_or_else(|| {
                AppError::BusinessRule(format!("Designação de prédio/vila {} inexistente ou concluída.", id))
            })
    }

    pub async fn delete_building_assignment(&self, id: i64) -> Result<(), AppError> {
        if !self.assignment_repo.delete_for_building(id).await? {
            return Err(AppError::not_found("Designação de prédio/vila", id));
        }
        Ok(())
    }
}
