// src/services/backup_service.rs

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    config::AppConfig,
    db::SchemaRepository,
    models::backup::{BackupInfo, backup_file_name, is_backup_name, parse_backup_name},
};

/// Cópias do banco em `BACKUP_DIR` (`backup_AAAAMMDD_HHMMSS_ffffff.db`), com
/// limpeza por idade e por quantidade.
#[derive(Clone)]
pub struct BackupService {
    schema_repo: SchemaRepository,
    backup_dir: PathBuf,
    database_path: Option<PathBuf>,
    max_files: usize,
    retention_days: i64,
    interval_days: i64,
    pool: SqlitePool,
}

impl BackupService {
    pub fn new(schema_repo: SchemaRepository, config: &AppConfig, pool: SqlitePool) -> Self {
        Self {
            schema_repo,
            backup_dir: config.backup_dir.clone(),
            database_path: config.database_path(),
            max_files: config.max_backup_files,
            retention_days: config.backup_retention_days,
            interval_days: config.backup_interval_days,
            pool,
        }
    }

    /// Gera um backup novo e descarta os que passaram dos limites.
    pub async fn create_backup(&self) -> Result<BackupInfo, AppError> {
        let backup = self.write_backup().await?;
        self.prune_backups().await?;
        Ok(backup)
    }

    /// Só gera backup se o último tiver mais de `BACKUP_INTERVAL_DAYS`.
    pub async fn backup_if_due(&self) -> Result<Option<BackupInfo>, AppError> {
        let now = Utc::now().naive_utc();
        if let Some(ultimo) = self.list_backups().await?.first() {
            let dentro_do_intervalo = Duration::try_days(self.interval_days)
                .is_some_and(|intervalo| now - ultimo.criado_em < intervalo);
            if dentro_do_intervalo {
                tracing::debug!("Último backup ({}) ainda dentro do intervalo", ultimo.nome);
                return Ok(None);
            }
        }
        self.create_backup().await.map(Some)
    }

    /// Backups existentes, do mais novo para o mais antigo.
    pub async fn list_backups(&self) -> Result<Vec<BackupInfo>, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("ler", &self.backup_dir, e)),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("ler", &self.backup_dir, e))?
        {
            let nome = entry.file_name().to_string_lossy().into_owned();
            if !is_backup_name(&nome) {
                continue;
            }
            let caminho = entry.path();
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| io_error("ler", &caminho, e))?;

            // Sem horário no nome, vale a data de modificação
            let criado_em = match parse_backup_name(&nome) {
                Some(momento) => momento,
                None => match metadata.modified() {
                    Ok(modified) => DateTime::<Utc>::from(modified).naive_utc(),
                    Err(_) => DateTime::<Utc>::from(UNIX_EPOCH).naive_utc(),
                },
            };

            backups.push(BackupInfo {
                nome,
                caminho,
                criado_em,
                tamanho_bytes: metadata.len(),
            });
        }

        backups.sort_by(|a, b| b.criado_em.cmp(&a.criado_em).then_with(|| b.nome.cmp(&a.nome)));
        Ok(backups)
    }

    /// Remove backups mais velhos que `BACKUP_RETENTION_DAYS` (0 desliga) e
    /// os que excedem `MAX_BACKUP_FILES`. Devolve quantos foram apagados.
    pub async fn prune_backups(&self) -> Result<usize, AppError> {
        let now = Utc::now().naive_utc();
        let backups = self.list_backups().await?;

        let mut mantidos = 0;
        let mut removidos = 0;
        for backup in backups {
            let vencido = self.retention_days > 0
                && Duration::try_days(self.retention_days)
                    .is_some_and(|retencao| now - backup.criado_em > retencao);
            let excedente = self.max_files > 0 && mantidos >= self.max_files;

            if vencido || excedente {
                tokio::fs::remove_file(&backup.caminho)
                    .await
                    .map_err(|e| io_error("remover", &backup.caminho, e))?;
                tracing::info!("🗑️ Backup antigo removido: {}", backup.nome);
                removidos += 1;
            } else {
                mantidos += 1;
            }
        }
        Ok(removidos)
    }

    /// Troca o arquivo do banco pelo backup indicado. Antes grava uma cópia do
    /// estado atual. A pool é fechada: quem chamou precisa abrir um estado novo.
    pub async fn restore_backup(&self, backup: &Path) -> Result<BackupInfo, AppError> {
        let Some(database_path) = self.database_path.clone() else {
            return Err(AppError::BusinessRule(
                "Banco em memória não pode ser restaurado de um arquivo.".to_string(),
            ));
        };
        if !tokio::fs::try_exists(backup)
            .await
            .map_err(|e| io_error("ler", backup, e))?
        {
            return Err(AppError::ResourceNotFound(format!("Backup {}", backup.display())));
        }

        // Sem limpeza aqui: o backup pedido pode ser um dos antigos
        let anterior = self.write_backup().await?;

        self.pool.close().await;

        tokio::fs::copy(backup, &database_path)
            .await
            .map_err(|e| io_error("restaurar", &database_path, e))?;

        // Arquivos auxiliares do modo WAL pertencem ao banco antigo
        for sufixo in ["-wal", "-shm"] {
            let mut auxiliar = database_path.clone().into_os_string();
            auxiliar.push(sufixo);
            match tokio::fs::remove_file(&auxiliar).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error("remover", Path::new(&auxiliar), e)),
            }
        }

        tracing::info!(
            "♻️ Banco restaurado de {} (estado anterior em {})",
            backup.display(),
            anterior.nome
        );
        Ok(anterior)
    }

    async fn write_backup(&self) -> Result<BackupInfo, AppError> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .map_err(|e| io_error("criar", &self.backup_dir, e))?;

        let criado_em = Utc::now().naive_utc();
        let nome = backup_file_name(criado_em);
        let caminho = self.backup_dir.join(&nome);

        self.schema_repo.vacuum_into(&caminho).await?;

        let tamanho_bytes = tokio::fs::metadata(&caminho)
            .await
            .map_err(|e| io_error("ler", &caminho, e))?
            .len();

        tracing::info!("💾 Backup criado: {} ({} bytes)", caminho.display(), tamanho_bytes);
        Ok(BackupInfo { nome, caminho, criado_em, tamanho_bytes })
    }
}

fn io_error(acao: &str, caminho: &Path, e: std::io::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!(
        "Falha ao {} {}: {}",
        acao,
        caminho.display(),
        e
    ))
}
