#![allow(dead_code)]

use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use territorios::{
    AppConfig, AppState,
    common::db_utils::run_migrations,
    models::{
        building::{Building, BuildingKind, NewBuilding, Unit},
        fieldwork::{NewOuting, Outing, WeekDay},
        territory::{NewStreet, Street, Territory, TerritoryPayload},
        user::{NewUser, PermissionLevel, User},
    },
};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bcrypt_cost: 4,
        seed_sample_data: false,
        ..AppConfig::default()
    }
}

// Banco em memória: uma única conexão que nunca é descartada
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

pub async fn setup_with(config: AppConfig) -> AppState {
    AppState::from_pool(memory_pool().await, config)
}

pub async fn setup() -> AppState {
    setup_with(test_config()).await
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn count(state: &AppState, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(&state.db_pool).await.unwrap()
}

// Território com uma rua, uma casa, um prédio de 3 apartamentos e uma saída
pub struct Fixture {
    pub territorio: Territory,
    pub rua: Street,
    pub casa: Building,
    pub predio: Building,
    pub apartamentos: Vec<Unit>,
    pub saida: Outing,
}

pub async fn fixture(state: &AppState) -> Fixture {
    let territorio = state
        .territory_service
        .create_territory(TerritoryPayload {
            nome: "Território 7".to_string(),
            descricao: Some("Quadra 3".to_string()),
        })
        .await
        .unwrap();

    let rua = state
        .territory_service
        .add_street(NewStreet {
            territorio_id: territorio.id,
            nome: "Rua das Palmeiras".to_string(),
        })
        .await
        .unwrap();

    let casa = building(state, rua.id, "10", BuildingKind::Residencial, None).await.imovel;
    let criado = building(state, rua.id, "20", BuildingKind::Predio, Some(3)).await;

    let saida = state
        .fieldwork_service
        .create_outing(NewOuting {
            nome: "Saída de sábado".to_string(),
            data: date(2026, 10, 17),
            dia_semana: WeekDay::Sabado,
            horario: "09:00".to_string(),
            dirigente: Some("Paulo".to_string()),
        })
        .await
        .unwrap();

    Fixture {
        territorio,
        rua,
        casa,
        predio: criado.imovel,
        apartamentos: criado.unidades,
        saida,
    }
}

pub async fn building(
    state: &AppState,
    rua_id: i64,
    numero: &str,
    tipo: BuildingKind,
    total_unidades: Option<i64>,
) -> territorios::services::building_service::CreatedBuilding {
    state
        .building_service
        .create_building(NewBuilding {
            rua_id,
            numero: numero.to_string(),
            tipo,
            nome: None,
            total_unidades,
            tipo_portaria: None,
            tipo_acesso: None,
            observacoes: None,
        })
        .await
        .unwrap()
}

pub async fn user(state: &AppState, email: &str, nivel: PermissionLevel) -> User {
    state
        .user_service
        .create_user(NewUser {
            nome: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            senha: "segredo123".to_string(),
            nivel_permissao: Some(nivel),
        })
        .await
        .unwrap()
}
