// src/services/building_service.rs

use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::BuildingRepository,
    models::building::{
        Building, BuildingDetails, BuildingKind, NewBuilding, NewUnit, NewWorkHistoryEntry, Unit,
        UpdateBuilding, WorkHistoryEntry,
    },
};

// Resultado do cadastro de um imóvel, com as unidades geradas
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedBuilding {
    pub imovel: Building,
    pub unidades: Vec<Unit>,
}

#[derive(Clone)]
pub struct BuildingService {
    repo: BuildingRepository,
    pool: SqlitePool,
}

impl BuildingService {
    pub fn new(repo: BuildingRepository, pool: SqlitePool) -> Self {
        Self { repo, pool }
    }

    /// Cadastra o imóvel. Prédios recebem "Apto 01..NN" e vilas "Casa 01..NN",
    /// tudo na mesma transação.
    pub async fn create_building(&self, payload: NewBuilding) -> Result<CreatedBuilding, AppError> {
        let mut tx = self.pool.begin().await?;
        let created = self.create_building_with(&mut *tx, payload).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Mesmo cadastro, dentro de uma transação aberta por quem chama.
    pub async fn create_building_with(
        &self,
        conn: &mut SqliteConnection,
        payload: NewBuilding,
    ) -> Result<CreatedBuilding, AppError> {
        payload.validate()?;

        let imovel = self.repo.create(&mut *conn, &payload).await?;

        let mut unidades = Vec::new();
        if let (Some(prefix), Some(total)) = (imovel.tipo.unit_prefix(), imovel.total_unidades) {
            for n in 1..=total {
                let unit = NewUnit {
                    imovel_id: imovel.id,
                    numero: format!("{} {:02}", prefix, n),
                    observacoes: None,
                };
                // Se falhar aqui, o imóvel criado acima é desfeito junto com a transação
                unidades.push(self.repo.create_unit(&mut *conn, &unit).await?);
            }
        }

        tracing::info!(
            "🏠 Imóvel {} ({}) criado na rua {} com {} unidade(s)",
            imovel.numero,
            imovel.tipo.as_str(),
            imovel.rua_id,
            unidades.len()
        );

        Ok(CreatedBuilding { imovel, unidades })
    }

    pub async fn get_building(&self, id: i64) -> Result<BuildingDetails, AppError> {
        self.repo
            .find_details(id)
            .await?
            .ok_or_else(|| AppError::not_found("Imóvel", id))
    }

    pub async fn list_by_street(&self, rua_id: i64) -> Result<Vec<Building>, AppError> {
        self.repo.list_by_street(rua_id).await
    }

    pub async fn list_by_kind(&self, tipo: BuildingKind) -> Result<Vec<BuildingDetails>, AppError> {
        self.repo.list_by_kind(tipo).await
    }

    pub async fn list_multi_unit(&self) -> Result<Vec<BuildingDetails>, AppError> {
        self.repo.list_multi_unit().await
    }

    pub async fn update_building(
        &self,
        id: i64,
        payload: UpdateBuilding,
    ) -> Result<Building, AppError> {
        payload.validate()?;
        self.repo
            .update(id, &payload)
            .await?
            .ok_or_else(|| AppError::not_found("Imóvel", id))
    }

    pub async fn delete_building(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("Imóvel", id));
        }
        Ok(())
    }

    // --- Unidades ---

    pub async fn add_unit(&self, payload: NewUnit) -> Result<Unit, AppError> {
        payload.validate()?;
        self.repo.create_unit(&self.pool, &payload).await
    }

    pub async fn get_unit(&self, id: i64) -> Result<Unit, AppError> {
        self.repo
            .find_unit(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Unidade", id))
    }

    pub async fn list_units(&self, imovel_id: i64) -> Result<Vec<Unit>, AppError> {
        self.repo.list_units(imovel_id).await
    }

    pub async fn delete_unit(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_unit(id).await? {
            return Err(AppError::not_found("Unidade", id));
        }
        Ok(())
    }

    // --- Histórico de trabalho ---

    pub async fn add_work_history(
        &self,
        payload: NewWorkHistoryEntry,
    ) -> Result<WorkHistoryEntry, AppError> {
        payload.validate()?;

        let imovel = self
            .repo
            .find_by_id(&self.pool, payload.imovel_id)
            .await?
            .ok_or_else(|| AppError::not_found("Imóvel", payload.imovel_id))?;

        if !imovel.tipo.is_multi_unit() {
            tracing::warn!("Histórico recusado para o imóvel {} ({})", imovel.id, imovel.tipo.as_str());
            return Err(AppError::BusinessRule(
                "Histórico de trabalho só existe para prédios e vilas.".to_string(),
            ));
        }

        self.repo.add_history(&payload).await
    }

    pub async fn work_history(&self, imovel_id: i64) -> Result<Vec<WorkHistoryEntry>, AppError> {
        self.repo.list_history(imovel_id).await
    }
}
