//src/main.rs

use territorios::config::AppState;
use tracing_subscriber::EnvFilter;

// Prepara o banco: migrações, dados iniciais e conferência do esquema
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, não há o que preparar
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    app_state
        .setup_service
        .migrate()
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    app_state
        .setup_service
        .seed()
        .await
        .expect("Falha ao inserir os dados iniciais.");

    let mut report = app_state
        .setup_service
        .validate_schema()
        .await
        .expect("Falha ao conferir o esquema do banco de dados.");

    if !report.is_valid() {
        tracing::warn!("Esquema incompleto, reaplicando os scripts de esquema...");
        report = app_state
            .setup_service
            .repair_schema()
            .await
            .expect("Falha ao corrigir o esquema do banco de dados.");
    }

    if !report.is_valid() {
        for table in &report.missing_tables {
            tracing::error!("Tabela ausente: {}", table);
        }
        for column in &report.missing_columns {
            tracing::error!("Coluna ausente: {}", column);
        }
        for index in &report.missing_indexes {
            tracing::error!("Índice ausente: {}", index);
        }
        std::process::exit(1);
    }

    if app_state.config.auto_backup {
        match app_state.backup_service.backup_if_due().await {
            Ok(Some(backup)) => tracing::info!("💾 Backup automático: {}", backup.nome),
            Ok(None) => {}
            Err(e) => tracing::warn!("Falha no backup automático: {}", e),
        }
    }

    let hoje = chrono::Utc::now().date_naive();
    if let Err(e) = app_state.notification_service.sweep_due_assignments(hoje).await {
        tracing::warn!("Falha ao verificar designações vencendo: {}", e);
    }

    tracing::info!("🚀 Banco de dados pronto em {}", app_state.config.database_url);
}
