// src/common/error.rs

use thiserror::Error;

// Erro único da crate. Os repositórios traduzem as violações de restrição
// do SQLite para as variantes específicas em `db_utils::map_db_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Token de sessão já existe")]
    SessionTokenAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Violação de chave estrangeira: {0}")]
    ForeignKeyViolation(String),

    #[error("Valor fora do domínio permitido: {0}")]
    CheckViolation(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("A unidade {unidade_id} não pertence ao imóvel {imovel_id}")]
    UnitOutsideBuilding { unidade_id: i64, imovel_id: i64 },

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(String),

    #[error("O template {0} é do sistema e não pode ser excluído")]
    ProtectedTemplate(i64),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro ao aplicar migrações: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    // Atalho usado pelos repositórios quando um `fetch_optional` volta vazio
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::ResourceNotFound(format!("{} {}", entity, id))
    }
}
