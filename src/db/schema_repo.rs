// src/db/schema_repo.rs

use std::path::Path;

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::common::error::AppError;

// Catálogo do SQLite (sqlite_master e PRAGMA table_info) e operações sobre o arquivo
#[derive(Clone)]
pub struct SchemaRepository {
    pool: SqlitePool,
}

impl SchemaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn table_names(&self) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn index_names(&self) -> Result<Vec<String>, AppError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'index' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn column_names(&self, table: &str) -> Result<Vec<String>, AppError> {
        // pragma_table_info aceita o nome como parâmetro
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;
        Ok(names)
    }

    /// Executa um script com vários comandos (os arquivos de `migrations/`).
    pub async fn apply_script<'e, E>(&self, executor: E, script: &'static str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::raw_sql(script).execute(executor).await?;
        Ok(())
    }

    /// Copia o banco aberto para `destino` com `VACUUM INTO`. Não roda dentro de transação.
    pub async fn vacuum_into(&self, destino: &Path) -> Result<(), AppError> {
        let caminho = destino
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Caminho de backup inválido: {}", destino.display()))?;
        // VACUUM INTO recebe um literal; aspas simples são dobradas
        let sql = format!("VACUUM INTO '{}'", caminho.replace('\'', "''"));
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}
