mod common;

use std::path::Path;

use territorios::{
    AppConfig, AppState,
    common::{db_utils::run_migrations, error::AppError},
    config::connect_pool,
    models::territory::TerritoryPayload,
};

use common::{setup, test_config};

// Banco em arquivo dentro de um diretório temporário, com os backups em `backups/`
fn file_config(dir: &Path) -> AppConfig {
    AppConfig {
        database_url: format!("sqlite://{}", dir.join("territorios.db").display()),
        backup_dir: dir.join("backups"),
        max_connections: 1,
        ..test_config()
    }
}

async fn open(config: AppConfig) -> AppState {
    let pool = connect_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    AppState::from_pool(pool, config)
}

async fn territorio(state: &AppState, nome: &str) -> i64 {
    state
        .territory_service
        .create_territory(TerritoryPayload {
            nome: nome.to_string(),
            descricao: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn backup_e_restauracao_em_arquivo() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(dir.path());
    let state = open(config.clone()).await;

    let id = territorio(&state, "Antes").await;
    let backup = state.backup_service.create_backup().await.unwrap();
    assert!(backup.nome.starts_with("backup_"));
    assert!(backup.caminho.starts_with(dir.path().join("backups")));
    assert!(backup.tamanho_bytes > 0);

    state.territory_service.delete_territory(id).await.unwrap();
    territorio(&state, "Depois").await;

    let anterior = state.backup_service.restore_backup(&backup.caminho).await.unwrap();
    assert_ne!(anterior.nome, backup.nome);
    assert!(state.db_pool.is_closed());

    let reaberto = open(config).await;
    let territorios = reaberto.territory_service.list_territories().await.unwrap();
    let nomes: Vec<_> = territorios.iter().map(|t| t.nome.as_str()).collect();
    assert_eq!(nomes, vec!["Antes"]);

    // O backup pedido e a cópia do estado anterior
    let backups = reaberto.backup_service.list_backups().await.unwrap();
    assert_eq!(backups.len(), 2);
    assert_eq!(backups[0].nome, anterior.nome);
}

#[tokio::test]
async fn limpeza_por_idade_e_quantidade() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(dir.path());
    config.max_backup_files = 2;
    config.backup_retention_days = 30;
    let state = open(config.clone()).await;

    let pasta = &config.backup_dir;
    tokio::fs::create_dir_all(pasta).await.unwrap();
    tokio::fs::write(pasta.join("backup_20200101_000000.db"), b"velho").await.unwrap();
    tokio::fs::write(pasta.join("notas.txt"), b"nao e backup").await.unwrap();

    let primeiro = state.backup_service.create_backup().await.unwrap();
    // O de 2020 passou da retenção
    assert!(!pasta.join("backup_20200101_000000.db").exists());

    let segundo = state.backup_service.create_backup().await.unwrap();
    let terceiro = state.backup_service.create_backup().await.unwrap();

    let nomes: Vec<_> = state
        .backup_service
        .list_backups()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.nome)
        .collect();
    assert_eq!(nomes, vec![terceiro.nome, segundo.nome]);
    assert!(!primeiro.caminho.exists());
    assert!(pasta.join("notas.txt").exists());

    // Sem nada acima dos limites, nada sai
    assert_eq!(state.backup_service.prune_backups().await.unwrap(), 0);
}

#[tokio::test]
async fn backup_automatico_respeita_o_intervalo() {
    let dir = tempfile::tempdir().unwrap();
    let state = open(file_config(dir.path())).await;

    assert!(state.backup_service.list_backups().await.unwrap().is_empty());
    let primeiro = state.backup_service.backup_if_due().await.unwrap();
    assert!(primeiro.is_some());
    assert!(state.backup_service.backup_if_due().await.unwrap().is_none());
    assert_eq!(state.backup_service.list_backups().await.unwrap().len(), 1);
}

#[tokio::test]
async fn restauracao_exige_banco_em_arquivo_e_backup_existente() {
    let state = setup().await;
    let erro = state
        .backup_service
        .restore_backup(Path::new("backup_20260101_000000.db"))
        .await
        .unwrap_err();
    assert!(matches!(erro, AppError::BusinessRule(_)));
    assert!(!state.db_pool.is_closed());

    let dir = tempfile::tempdir().unwrap();
    let em_arquivo = open(file_config(dir.path())).await;
    let erro = em_arquivo
        .backup_service
        .restore_backup(&dir.path().join("backups/backup_20260101_000000.db"))
        .await
        .unwrap_err();
    assert!(matches!(erro, AppError::ResourceNotFound(_)));
    assert!(!em_arquivo.db_pool.is_closed());
}
