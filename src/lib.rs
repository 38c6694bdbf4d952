//src/lib.rs

// Camada de dados do sistema de territórios: esquema, repositórios e serviços
pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use common::error::AppError;
pub use config::{AppConfig, AppState};
