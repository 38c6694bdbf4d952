// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    common::error::AppError,
    db::{
        ActivityRepository, AssignmentRepository, BuildingRepository, NotificationRepository,
        OutingRepository, ReportRepository, SchemaRepository, SessionRepository,
        TerritoryRepository, UserRepository, VisitRepository,
    },
    models::reports::ExportFormat,
    services::{
        activity_service::ActivityService, backup_service::BackupService,
        building_service::BuildingService,
        fieldwork_service::FieldworkService, notification_service::NotificationService,
        report_service::ReportService, session_service::SessionService,
        setup_service::SetupService, territory_service::TerritoryService,
        user_service::UserService, visit_service::VisitService,
    },
};

// Valores lidos do ambiente (ou do .env), com os padrões do sistema
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session_timeout_minutes: i64,
    pub notification_alert_days: i64,
    pub max_cached_reports: i64,
    pub default_export_format: ExportFormat,
    pub bcrypt_cost: u32,
    pub seed_sample_data: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub backup_dir: PathBuf,
    pub max_backup_files: usize,
    pub backup_retention_days: i64,
    pub backup_interval_days: i64,
    pub auto_backup: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/territorios.db".to_string(),
            max_connections: 5,
            session_timeout_minutes: 30,
            notification_alert_days: 5,
            max_cached_reports: 10,
            default_export_format: ExportFormat::Pdf,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            seed_sample_data: true,
            admin_email: "admin@sistema.local".to_string(),
            admin_password: "admin123".to_string(),
            backup_dir: PathBuf::from("backups"),
            max_backup_files: 10,
            backup_retention_days: 30,
            backup_interval_days: 7,
            auto_backup: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            session_timeout_minutes: env_or("SESSION_TIMEOUT_MINUTES", defaults.session_timeout_minutes)?,
            notification_alert_days: env_or("NOTIFICATION_ALERT_DAYS", defaults.notification_alert_days)?,
            max_cached_reports: env_or("MAX_CACHED_REPORTS", defaults.max_cached_reports)?,
            default_export_format: env_or("DEFAULT_EXPORT_FORMAT", defaults.default_export_format)?,
            bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost)?,
            seed_sample_data: env_or("SEED_SAMPLE_DATA", defaults.seed_sample_data)?,
            admin_email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            backup_dir: env::var("BACKUP_DIR").map(PathBuf::from).unwrap_or(defaults.backup_dir),
            max_backup_files: env_or("MAX_BACKUP_FILES", defaults.max_backup_files)?,
            backup_retention_days: env_or("BACKUP_RETENTION_DAYS", defaults.backup_retention_days)?,
            backup_interval_days: env_or("BACKUP_INTERVAL_DAYS", defaults.backup_interval_days)?,
            auto_backup: env_or("AUTO_BACKUP", defaults.auto_backup)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Confere os limites numéricos antes de montar os serviços.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_range("DATABASE_MAX_CONNECTIONS", self.max_connections as i64, 1, 100)?;
        check_range("SESSION_TIMEOUT_MINUTES", self.session_timeout_minutes, 1, MINUTES_PER_YEAR)?;
        check_range("NOTIFICATION_ALERT_DAYS", self.notification_alert_days, 0, 365)?;
        check_range("MAX_CACHED_REPORTS", self.max_cached_reports, 1, 1_000)?;
        check_range("BCRYPT_COST", self.bcrypt_cost as i64, 4, 31)?;
        check_range("MAX_BACKUP_FILES", self.max_backup_files as i64, 1, 1_000)?;
        check_range("BACKUP_RETENTION_DAYS", self.backup_retention_days, 0, 3_650)?;
        check_range("BACKUP_INTERVAL_DAYS", self.backup_interval_days, 0, 365)?;
        Ok(())
    }

    /// Caminho do arquivo do banco; `None` para bancos em memória.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.database_url.contains(":memory:") || self.database_url.contains("mode=memory") {
            return None;
        }
        SqliteConnectOptions::from_str(&self.database_url)
            .ok()
            .map(|options| options.get_filename().to_path_buf())
    }
}

const MINUTES_PER_YEAR: i64 = 525_600;

fn check_range(key: &str, value: i64, min: i64, max: i64) -> anyhow::Result<()> {
    if value < min || value > max {
        anyhow::bail!("{} deve estar entre {} e {} (recebido {})", key, min, max, value);
    }
    Ok(())
}

// Lê e converte uma variável; ausente = valor padrão
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {}: {} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}

/// Abre a pool SQLite. O arquivo (e o diretório) são criados se não existirem
/// e as chaves estrangeiras ficam ligadas em toda conexão.
pub async fn connect_pool(config: &AppConfig) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("Falha ao criar {}: {}", parent.display(), e))?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: AppConfig,
    pub territory_service: TerritoryService,
    pub building_service: BuildingService,
    pub fieldwork_service: FieldworkService,
    pub visit_service: VisitService,
    pub user_service: UserService,
    pub session_service: SessionService,
    pub activity_service: ActivityService,
    pub notification_service: NotificationService,
    pub report_service: ReportService,
    pub setup_service: SetupService,
    pub backup_service: BackupService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = connect_pool(&config).await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida: {}", config.database_url);

        Ok(Self::from_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: SqlitePool, config: AppConfig) -> Self {
        let territory_repo = TerritoryRepository::new(db_pool.clone());
        let building_repo = BuildingRepository::new(db_pool.clone());
        let outing_repo = OutingRepository::new(db_pool.clone());
        let assignment_repo = AssignmentRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new(db_pool.clone());
        let user_repo = UserRepository::new(db_pool.clone());
        let session_repo = SessionRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let schema_repo = SchemaRepository::new(db_pool.clone());

        let territory_service = TerritoryService::new(territory_repo.clone(), db_pool.clone());
        let building_service = BuildingService::new(building_repo.clone(), db_pool.clone());
        let fieldwork_service = FieldworkService::new(
            outing_repo.clone(),
            assignment_repo.clone(),
            building_repo.clone(),
            db_pool.clone(),
        );
        let visit_service = VisitService::new(
            visit_repo,
            building_repo,
            territory_repo.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone(), config.bcrypt_cost, db_pool.clone());
        let session_service = SessionService::new(
            session_repo,
            user_repo.clone(),
            config.session_timeout_minutes,
            db_pool.clone(),
        );
        let activity_service = ActivityService::new(activity_repo, db_pool.clone());
        let notification_service = NotificationService::new(
            notification_repo,
            assignment_repo,
            user_repo.clone(),
            config.notification_alert_days,
            db_pool.clone(),
        );
        let report_service = ReportService::new(
            report_repo,
            config.max_cached_reports,
            config.default_export_format,
            db_pool.clone(),
        );
        let backup_service = BackupService::new(schema_repo.clone(), &config, db_pool.clone());
        let setup_service = SetupService::new(
            schema_repo,
            user_repo,
            territory_repo,
            outing_repo,
            user_service.clone(),
            building_service.clone(),
            config.clone(),
            db_pool.clone(),
        );

        Self {
            db_pool,
            config,
            territory_service,
            building_service,
            fieldwork_service,
            visit_service,
            user_service,
            session_service,
            activity_service,
            notification_service,
            report_service,
            setup_service,
            backup_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejeita_limites_fora_do_intervalo() {
        assert!(AppConfig::default().validate().is_ok());

        let zero_cache = AppConfig { max_cached_reports: 0, ..AppConfig::default() };
        assert!(zero_cache.validate().is_err());

        let negativo = AppConfig { max_cached_reports: -1, ..AppConfig::default() };
        assert!(negativo.validate().is_err());

        let sessao_enorme = AppConfig { session_timeout_minutes: i64::MAX, ..AppConfig::default() };
        assert!(sessao_enorme.validate().is_err());

        let alerta_enorme = AppConfig { notification_alert_days: i64::MAX / 2, ..AppConfig::default() };
        let err = alerta_enorme.validate().unwrap_err();
        assert!(err.to_string().contains("NOTIFICATION_ALERT_DAYS"));
    }

    #[test]
    fn caminho_do_banco() {
        let memoria = AppConfig { database_url: "sqlite::memory:".to_string(), ..AppConfig::default() };
        assert_eq!(memoria.database_path(), None);

        let arquivo = AppConfig { database_url: "sqlite://data/territorios.db".to_string(), ..AppConfig::default() };
        assert_eq!(arquivo.database_path(), Some(PathBuf::from("data/territorios.db")));
    }
}
