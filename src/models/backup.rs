// src/models/backup.rs

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

pub const BACKUP_PREFIX: &str = "backup_";
pub const BACKUP_EXTENSION: &str = ".db";

// backup_AAAAMMDD_HHMMSS_ffffff.db (o formato sem fração também é aceito)
const NAME_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";
const LEGACY_NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub nome: String,
    pub caminho: PathBuf,
    pub criado_em: NaiveDateTime,
    pub tamanho_bytes: u64,
}

pub fn backup_file_name(momento: NaiveDateTime) -> String {
    format!("{}{}{}", BACKUP_PREFIX, momento.format(NAME_FORMAT), BACKUP_EXTENSION)
}

/// Lê o horário gravado no nome do arquivo. `None` se o nome não segue o padrão.
pub fn parse_backup_name(nome: &str) -> Option<NaiveDateTime> {
    let stamp = nome.strip_prefix(BACKUP_PREFIX)?.strip_suffix(BACKUP_EXTENSION)?;
    NaiveDateTime::parse_from_str(stamp, NAME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(stamp, LEGACY_NAME_FORMAT))
        .ok()
}

pub fn is_backup_name(nome: &str) -> bool {
    nome.starts_with(BACKUP_PREFIX) && nome.ends_with(BACKUP_EXTENSION)
}
