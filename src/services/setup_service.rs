// src/services/setup_service.rs

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::{
    common::{db_utils::run_migrations, error::AppError},
    config::AppConfig,
    db::{OutingRepository, SchemaRepository, TerritoryRepository, UserRepository},
    models::{
        building::{BuildingKind, NewBuilding},
        fieldwork::{NewOuting, WeekDay},
        schema::{SchemaReport, SeedSummary},
        territory::{NewStreet, TerritoryPayload},
        user::{NewUser, PermissionLevel},
    },
    services::{building_service::BuildingService, user_service::UserService},
};

// Os mesmos arquivos das migrações; só usam CREATE ... IF NOT EXISTS
const SCHEMA_SCRIPTS: &[(&str, &str)] = &[
    ("0001_schema_base.sql", include_str!("../../migrations/0001_schema_base.sql")),
    ("0002_schema_usuarios.sql", include_str!("../../migrations/0002_schema_usuarios.sql")),
    ("0003_schema_relatorios.sql", include_str!("../../migrations/0003_schema_relatorios.sql")),
];

// Catálogo esperado: tabela -> colunas
const EXPECTED_TABLES: &[(&str, &[&str])] = &[
    ("territorios", &["id", "nome", "descricao", "ultima_visita", "data_criacao"]),
    ("ruas", &["id", "territorio_id", "nome"]),
    (
        "imoveis",
        &[
            "id", "rua_id", "numero", "tipo", "nome", "total_unidades",
            "tipo_portaria", "tipo_acesso", "observacoes",
        ],
    ),
    ("unidades", &["id", "imovel_id", "numero", "observacoes"]),
    ("saidas_campo", &["id", "nome", "data", "dia_semana", "horario", "dirigente", "data_criacao"]),
    (
        "designacoes",
        &[
            "id", "territorio_id", "saida_campo_id", "data_designacao", "data_devolucao",
            "responsavel", "status",
        ],
    ),
    (
        "atendimentos",
        &["id", "imovel_id", "unidade_id", "data", "resultado", "observacoes", "data_registro"],
    ),
    ("historico_predios_vilas", &["id", "imovel_id", "data", "descricao", "data_registro"]),
    (
        "designacoes_predios_vilas",
        &[
            "id", "imovel_id", "responsavel", "saida_campo_id", "data_designacao",
            "data_devolucao", "status",
        ],
    ),
    (
        "usuarios",
        &[
            "id", "nome", "email", "senha_hash", "nivel_permissao", "ativo", "preferencias",
            "ultima_atividade", "data_criacao",
        ],
    ),
    (
        "perfis_usuario",
        &["id", "usuario_id", "telefone", "cargo", "congregacao", "bio", "data_atualizacao"],
    ),
    ("configuracoes_usuario", &["id", "usuario_id", "chave", "valor"]),
    (
        "sessoes",
        &[
            "id", "usuario_id", "token", "ip_address", "user_agent", "data_criacao",
            "data_expiracao", "ativa",
        ],
    ),
    (
        "log_atividades",
        &["id", "usuario_id", "tipo_acao", "descricao", "data_hora", "entidade", "entidade_id"],
    ),
    (
        "notificacoes",
        &[
            "id", "usuario_id", "tipo", "titulo", "mensagem", "status", "data_criacao",
            "data_leitura", "link", "entidade", "entidade_id",
        ],
    ),
    (
        "relatorios",
        &[
            "id", "nome", "tipo", "descricao", "filtros", "usuario_id", "compartilhado",
            "data_criacao", "ultima_execucao",
        ],
    ),
    ("relatorio_resultados", &["id", "relatorio_id", "resultados", "data_geracao"]),
    (
        "relatorio_exportacoes",
        &[
            "id", "relatorio_id", "usuario_id", "formato", "caminho_arquivo", "tamanho_bytes",
            "data_exportacao",
        ],
    ),
    (
        "relatorio_agendamentos",
        &[
            "id", "relatorio_id", "usuario_id", "frequencia", "hora", "proxima_execucao",
            "ultima_execucao", "dia_referencia", "enviar_email", "emails_destinatarios", "ativo",
        ],
    ),
    (
        "relatorio_templates",
        &[
            "id", "nome", "tipo", "descricao", "filtros_padrao", "template", "usuario_id",
            "sistema", "data_criacao",
        ],
    ),
    (
        "relatorio_compartilhamentos",
        &["id", "relatorio_id", "usuario_id", "permissao", "data_compartilhamento"],
    ),
];

const EXPECTED_INDEXES: &[&str] = &[
    "idx_ruas_territorio_id",
    "idx_imoveis_rua_id",
    "idx_imoveis_tipo",
    "idx_unidades_imovel_id",
    "idx_designacoes_territorio_id",
    "idx_designacoes_saida_campo_id",
    "idx_designacoes_status",
    "idx_atendimentos_imovel_id",
    "idx_atendimentos_unidade_id",
    "idx_atendimentos_data",
    "idx_historico_imovel_id",
    "idx_designacoes_predios_vilas_imovel_id",
    "idx_designacoes_predios_vilas_status",
    "idx_usuarios_email",
    "idx_perfis_usuario_id",
    "idx_configuracoes_usuario_id",
    "idx_sessoes_usuario_id",
    "idx_sessoes_token",
    "idx_log_usuario_id",
    "idx_log_data_hora",
    "idx_notificacoes_usuario_id",
    "idx_notificacoes_status",
    "idx_relatorios_usuario_id",
    "idx_relatorios_tipo",
    "idx_relatorios_ultima_execucao",
    "idx_resultados_relatorio_id",
    "idx_exportacoes_relatorio_id",
    "idx_exportacoes_usuario_id",
    "idx_agendamentos_relatorio_id",
    "idx_agendamentos_proxima_execucao",
    "idx_templates_tipo",
    "idx_compartilhamentos_relatorio_id",
    "idx_compartilhamentos_usuario_id",
];

// Saídas de exemplo: (nome, dia, horário, dirigente)
const SAMPLE_OUTINGS: &[(&str, WeekDay, &str, &str)] = &[
    ("Saída 1", WeekDay::Terca, "09:00", "João"),
    ("Saída 2", WeekDay::Quarta, "19:30", "Maria"),
    ("Saída 3", WeekDay::Sexta, "14:00", "Pedro"),
];

// Próxima data (hoje inclusive) que cai no dia da semana pedido
fn next_weekday(from: NaiveDate, dia: WeekDay) -> NaiveDate {
    (0..7)
        .map(|d| from + Duration::days(d))
        .find(|d| WeekDay::of(*d) == dia)
        .unwrap_or(from)
}

/// Preparação do banco: migrações, dados iniciais e conferência do esquema.
#[derive(Clone)]
pub struct SetupService {
    schema_repo: SchemaRepository,
    user_repo: UserRepository,
    territory_repo: TerritoryRepository,
    outing_repo: OutingRepository,
    user_service: UserService,
    building_service: BuildingService,
    config: AppConfig,
    pool: SqlitePool,
}

impl SetupService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema_repo: SchemaRepository,
        user_repo: UserRepository,
        territory_repo: TerritoryRepository,
        outing_repo: OutingRepository,
        user_service: UserService,
        building_service: BuildingService,
        config: AppConfig,
        pool: SqlitePool,
    ) -> Self {
        Self {
            schema_repo,
            user_repo,
            territory_repo,
            outing_repo,
            user_service,
            building_service,
            config,
            pool,
        }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        run_migrations(&self.pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
        Ok(())
    }

    /// Insere o administrador padrão e, se configurado, os dados de exemplo.
    /// Só age sobre tabelas vazias, então pode rodar a cada inicialização.
    pub async fn seed(&self) -> Result<SeedSummary, AppError> {
        let mut summary = SeedSummary::default();

        if self.user_repo.count(&self.pool).await? == 0 {
            self.user_service
                .create_user(NewUser {
                    nome: "Administrador".to_string(),
                    email: self.config.admin_email.clone(),
                    senha: self.config.admin_password.clone(),
                    nivel_permissao: Some(PermissionLevel::Admin),
                })
                .await?;
            summary.admin_created = true;
        }

        if !self.config.seed_sample_data {
            return Ok(summary);
        }

        // Território de exemplo e saídas entram juntos ou não entram
        let mut tx = self.pool.begin().await?;

        if self.territory_repo.count(&mut *tx).await? == 0 {
            summary.sample_territory_id = Some(self.seed_sample_territory(&mut *tx).await?);
        }

        if self.outing_repo.count(&mut *tx).await? == 0 {
            let hoje = Utc::now().date_naive();
            for (nome, dia, horario, dirigente) in SAMPLE_OUTINGS {
                let outing = NewOuting {
                    nome: nome.to_string(),
                    data: next_weekday(hoje, *dia),
                    dia_semana: *dia,
                    horario: horario.to_string(),
                    dirigente: Some(dirigente.to_string()),
                };
                outing.validate()?;
                self.outing_repo.create(&mut *tx, &outing).await?;
                summary.outings_created += 1;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "🌱 Dados iniciais: admin={}, território={:?}, saídas={}",
            summary.admin_created,
            summary.sample_territory_id,
            summary.outings_created
        );
        Ok(summary)
    }

    async fn seed_sample_territory(&self, conn: &mut SqliteConnection) -> Result<i64, AppError> {
        let territory = TerritoryPayload {
            nome: "Território 1".to_string(),
            descricao: Some("Quadra 10 - Setor Central".to_string()),
        };
        territory.validate()?;
        let territory = self.territory_repo.create(&mut *conn, &territory).await?;

        let street = NewStreet {
            territorio_id: territory.id,
            nome: "Rua das Flores".to_string(),
        };
        street.validate()?;
        let street = self.territory_repo.create_street(&mut *conn, &street).await?;

        let samples = [
            ("123", BuildingKind::Residencial, None, None),
            ("125", BuildingKind::Comercial, None, None),
            ("127", BuildingKind::Predio, Some("Edifício Central"), Some(12)),
            ("129", BuildingKind::Vila, Some("Vila Aurora"), Some(8)),
        ];
        for (numero, tipo, nome, total_unidades) in samples {
            self.building_service
                .create_building_with(
                    &mut *conn,
                    NewBuilding {
                        rua_id: street.id,
                        numero: numero.to_string(),
                        tipo,
                        nome: nome.map(str::to_string),
                        total_unidades,
                        tipo_portaria: None,
                        tipo_acesso: None,
                        observacoes: None,
                    },
                )
                .await?;
        }

        Ok(territory.id)
    }

    /// Compara o banco aberto com o catálogo esperado de tabelas, colunas e índices.
    pub async fn validate_schema(&self) -> Result<SchemaReport, AppError> {
        let mut report = SchemaReport::default();

        let tables = self.schema_repo.table_names().await?;
        for (table, columns) in EXPECTED_TABLES {
            if !tables.iter().any(|t| t == table) {
                report.missing_tables.push(table.to_string());
                continue;
            }
            let existing = self.schema_repo.column_names(table).await?;
            for column in columns.iter() {
                if !existing.iter().any(|c| c == column) {
                    report.missing_columns.push(format!("{}.{}", table, column));
                }
            }
        }

        let indexes = self.schema_repo.index_names().await?;
        for index in EXPECTED_INDEXES {
            if !indexes.iter().any(|i| i == index) {
                report.missing_indexes.push(index.to_string());
            }
        }

        if report.is_valid() {
            tracing::info!("✅ Esquema do banco de dados conferido");
        } else {
            tracing::warn!(
                "Esquema incompleto: {} tabela(s), {} coluna(s) e {} índice(s) ausentes",
                report.missing_tables.len(),
                report.missing_columns.len(),
                report.missing_indexes.len()
            );
        }
        Ok(report)
    }

    /// Reaplica os scripts de esquema (idempotentes) e confere de novo. Recria
    /// tabelas e índices ausentes; colunas ausentes continuam no relatório.
    pub async fn repair_schema(&self) -> Result<SchemaReport, AppError> {
        let before = self.validate_schema().await?;
        if before.is_valid() {
            return Ok(before);
        }

        let mut tx = self.pool.begin().await?;
        for (nome, script) in SCHEMA_SCRIPTS {
            self.schema_repo.apply_script(&mut *tx, script).await?;
            tracing::info!("🔧 Script de esquema reaplicado: {}", nome);
        }
        tx.commit().await?;

        let after = self.validate_schema().await?;
        if !after.is_valid() {
            tracing::warn!("Esquema continua incompleto após a correção: {:?}", after);
        }
        Ok(after)
    }
}
