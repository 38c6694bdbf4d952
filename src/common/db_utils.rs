// src/common/db_utils.rs

use sqlx::SqlitePool;

use crate::common::error::AppError;

/// Traduz as violações de restrição do SQLite para as variantes de `AppError`.
///
/// O SQLite não expõe o nome da restrição como o Postgres, então a coluna
/// violada é lida da mensagem ("UNIQUE constraint failed: usuarios.email").
pub fn map_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        let message = db_err.message().to_string();

        if db_err.is_unique_violation() {
            return match unique_target(&message) {
                Some("usuarios.email") => AppError::EmailAlreadyExists,
                Some("sessoes.token") => AppError::SessionTokenAlreadyExists,
                _ => AppError::UniqueConstraintViolation(message),
            };
        }
        if db_err.is_foreign_key_violation() {
            return AppError::ForeignKeyViolation(message);
        }
        if db_err.is_check_violation() {
            return AppError::CheckViolation(message);
        }
    }
    e.into()
}

// "UNIQUE constraint failed: a.b, a.c" -> "a.b, a.c"
fn unique_target(message: &str) -> Option<&str> {
    message
        .strip_prefix("UNIQUE constraint failed: ")
        .map(str::trim)
}

/// Aplica as migrações embutidas (`migrations/`) na ordem.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::unique_target;

    #[test]
    fn extrai_a_coluna_da_mensagem_de_unicidade() {
        assert_eq!(
            unique_target("UNIQUE constraint failed: usuarios.email"),
            Some("usuarios.email")
        );
        assert_eq!(unique_target("FOREIGN KEY constraint failed"), None);
    }
}
