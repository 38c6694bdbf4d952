mod common;

use chrono::{Duration, Utc};
use serde_json::json;
use territorios::{
    AppError, AppState,
    models::{
        reports::{
            ExportFormat, NewReportExport, NewReportSchedule, NewReportTemplate, NewSavedReport,
            ReportKind, SavedReport, ScheduleFrequency, SharePermission,
        },
        user::PermissionLevel,
    },
};

use common::{count, date, setup, setup_with, test_config, user};

async fn report(
    state: &AppState,
    nome: &str,
    usuario_id: Option<i64>,
    compartilhado: bool,
) -> SavedReport {
    state
        .report_service
        .create_report(NewSavedReport {
            nome: nome.to_string(),
            tipo: ReportKind::Atendimentos,
            descricao: None,
            filtros: Some(json!({ "territorioId": 7 })),
            usuario_id,
            compartilhado,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn cache_guarda_apenas_as_ultimas_geracoes() {
    let state = setup().await;
    let dono = user(&state, "dono@congregacao.org", PermissionLevel::Gestor).await;
    let r = report(&state, "Atendimentos do mês", Some(dono.id), false).await;
    assert!(r.ultima_execucao.is_none());

    for i in 0..12 {
        state
            .report_service
            .store_result(r.id, json!({ "geracao": i }))
            .await
            .unwrap();
    }

    let cache = state.report_service.cached_results(r.id).await.unwrap();
    assert_eq!(cache.len(), 10);
    assert_eq!(cache[0].resultados.0["geracao"], 11);
    assert_eq!(cache[9].resultados.0["geracao"], 2);

    let ultimo = state.report_service.latest_result(r.id).await.unwrap().unwrap();
    assert_eq!(ultimo.id, cache[0].id);

    let atualizado = state.report_service.get_report(r.id).await.unwrap();
    assert!(atualizado.ultima_execucao.is_some());
}

#[tokio::test]
async fn limite_do_cache_vem_da_configuracao() {
    let mut config = test_config();
    config.max_cached_reports = 2;
    let state = setup_with(config).await;
    let r = report(&state, "Sistema", None, false).await;

    for i in 0..5 {
        state.report_service.store_result(r.id, json!([i])).await.unwrap();
    }
    assert_eq!(count(&state, "SELECT COUNT(*) FROM relatorio_resultados").await, 2);
}

#[tokio::test]
async fn resultado_de_relatorio_inexistente_falha() {
    let state = setup().await;
    let err = state.report_service.store_result(42, json!({})).await.unwrap_err();
    assert!(matches!(err, AppError::DatabaseError(_) | AppError::ForeignKeyViolation(_)));
    assert_eq!(count(&state, "SELECT COUNT(*) FROM relatorio_resultados").await, 0);
}

#[tokio::test]
async fn visibilidade_dos_relatorios() {
    let state = setup().await;
    let ana = user(&state, "ana@congregacao.org", PermissionLevel::Gestor).await;
    let bia = user(&state, "bia@congregacao.org", PermissionLevel::Basico).await;

    let da_ana = report(&state, "A - privado da Ana", Some(ana.id), false).await;
    report(&state, "B - do sistema", None, false).await;
    report(&state, "C - público da Ana", Some(ana.id), true).await;
    let compartilhado = report(&state, "D - compartilhado com a Bia", Some(ana.id), false).await;

    let nomes = |lista: Vec<SavedReport>| lista.into_iter().map(|r| r.nome).collect::<Vec<_>>();

    assert_eq!(
        nomes(state.report_service.visible_reports(ana.id).await.unwrap()),
        vec!["A - privado da Ana", "B - do sistema", "C - público da Ana", "D - compartilhado com a Bia"]
    );
    assert_eq!(
        nomes(state.report_service.visible_reports(bia.id).await.unwrap()),
        vec!["B - do sistema", "C - público da Ana"]
    );

    state
        .report_service
        .share(compartilhado.id, bia.id, SharePermission::Leitura)
        .await
        .unwrap();
    assert_eq!(state.report_service.visible_reports(bia.id).await.unwrap().len(), 3);

    // Reaproveita o compartilhamento existente
    let edicao = state
        .report_service
        .share(compartilhado.id, bia.id, SharePermission::Edicao)
        .await
        .unwrap();
    assert_eq!(edicao.permissao, SharePermission::Edicao);
    assert_eq!(state.report_service.shares(compartilhado.id).await.unwrap().len(), 1);

    assert!(state.report_service.revoke_share(compartilhado.id, bia.id).await.unwrap());
    assert!(!state.report_service.revoke_share(compartilhado.id, bia.id).await.unwrap());
    assert_eq!(state.report_service.visible_reports(bia.id).await.unwrap().len(), 2);

    let filtrado = state
        .report_service
        .update_filters(da_ana.id, Some(json!({ "resultado": "atendido" })))
        .await
        .unwrap();
    assert_eq!(filtrado.filtros.unwrap().0["resultado"], "atendido");

    assert_eq!(
        state.report_service.reports_by_kind(ReportKind::Atendimentos).await.unwrap().len(),
        4
    );
    assert!(state.report_service.reports_by_kind(ReportKind::Territorios).await.unwrap().is_empty());

    state.report_service.delete_report(da_ana.id).await.unwrap();
    let err = state.report_service.get_report(da_ana.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[tokio::test]
async fn exportacoes_usam_o_formato_padrao() {
    let state = setup().await;
    let u = user(&state, "eva@congregacao.org", PermissionLevel::Gestor).await;
    let r = report(&state, "Territórios", Some(u.id), false).await;

    let padrao = state
        .report_service
        .record_export(NewReportExport {
            relatorio_id: r.id,
            usuario_id: u.id,
            formato: None,
            caminho_arquivo: "exports/territorios.pdf".to_string(),
            tamanho_bytes: Some(2048),
        })
        .await
        .unwrap();
    assert_eq!(padrao.formato, ExportFormat::Pdf);

    let csv = state
        .report_service
        .record_export(NewReportExport {
            relatorio_id: r.id,
            usuario_id: u.id,
            formato: Some(ExportFormat::Csv),
            caminho_arquivo: "exports/territorios.csv".to_string(),
            tamanho_bytes: None,
        })
        .await
        .unwrap();
    assert_eq!(csv.formato, ExportFormat::Csv);

    let por_relatorio = state.report_service.exports_for_report(r.id).await.unwrap();
    assert_eq!(por_relatorio.len(), 2);
    assert_eq!(por_relatorio[0].id, csv.id);
    assert_eq!(state.report_service.exports_for_user(u.id).await.unwrap().len(), 2);

    let err = state
        .report_service
        .record_export(NewReportExport {
            relatorio_id: r.id,
            usuario_id: u.id,
            formato: None,
            caminho_arquivo: String::new(),
            tamanho_bytes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn agendamentos_avancam_pela_frequencia() {
    let state = setup().await;
    let u = user(&state, "ivo@congregacao.org", PermissionLevel::Admin).await;
    let r = report(&state, "Designações", Some(u.id), false).await;

    let antes = Utc::now().naive_utc();
    let agendamento = state
        .report_service
        .create_schedule(NewReportSchedule {
            relatorio_id: r.id,
            usuario_id: u.id,
            frequencia: ScheduleFrequency::Diario,
            hora: "08:00".to_string(),
            enviar_email: true,
            emails_destinatarios: vec!["a@x.org".to_string(), "b@x.org".to_string()],
        })
        .await
        .unwrap();
    assert!(agendamento.ativo);
    assert!(agendamento.proxima_execucao > antes);
    assert!(agendamento.proxima_execucao <= antes + Duration::days(1));
    assert_eq!(agendamento.proxima_execucao.format("%H:%M").to_string(), "08:00");
    assert_eq!(agendamento.recipients(), vec!["a@x.org", "b@x.org"]);

    assert!(state.report_service.due_schedules(antes).await.unwrap().is_empty());
    let vencidos = state
        .report_service
        .due_schedules(agendamento.proxima_execucao)
        .await
        .unwrap();
    assert_eq!(vencidos.len(), 1);

    let executado = state
        .report_service
        .mark_schedule_run(agendamento.id, agendamento.proxima_execucao)
        .await
        .unwrap();
    assert_eq!(executado.ultima_execucao, Some(agendamento.proxima_execucao));
    assert_eq!(executado.proxima_execucao, agendamento.proxima_execucao + Duration::days(1));

    // Execução atrasada três dias pula as ocorrências perdidas
    let atrasado = executado.proxima_execucao + Duration::days(3) + Duration::minutes(5);
    let depois = state
        .report_service
        .mark_schedule_run(agendamento.id, atrasado)
        .await
        .unwrap();
    assert!(depois.proxima_execucao > atrasado);
    assert_eq!(depois.proxima_execucao, executado.proxima_execucao + Duration::days(4));

    state.report_service.deactivate_schedule(agendamento.id).await.unwrap();
    assert!(
        state
            .report_service
            .due_schedules(depois.proxima_execucao + Duration::days(30))
            .await
            .unwrap()
            .is_empty()
    );

    let err = state
        .report_service
        .create_schedule(NewReportSchedule {
            relatorio_id: r.id,
            usuario_id: u.id,
            frequencia: ScheduleFrequency::Semanal,
            hora: "25:00".to_string(),
            enviar_email: false,
            emails_destinatarios: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn templates_do_sistema_sao_protegidos() {
    let state = setup().await;

    let sistema = state
        .report_service
        .create_template(NewReportTemplate {
            nome: "Resumo padrão".to_string(),
            tipo: ReportKind::Territorios,
            descricao: None,
            filtros_padrao: Some(json!({ "periodo": "mes" })),
            template: None,
            usuario_id: None,
            sistema: true,
        })
        .await
        .unwrap();
    let proprio = state
        .report_service
        .create_template(NewReportTemplate {
            nome: "Meu resumo".to_string(),
            tipo: ReportKind::Territorios,
            descricao: Some("Cópia ajustada".to_string()),
            filtros_padrao: None,
            template: Some("<h1>{{nome}}</h1>".to_string()),
            usuario_id: None,
            sistema: false,
        })
        .await
        .unwrap();

    let lista = state.report_service.templates(ReportKind::Territorios).await.unwrap();
    assert_eq!(lista.len(), 2);
    assert_eq!(lista[0].id, sistema.id);

    let err = state.report_service.delete_template(sistema.id).await.unwrap_err();
    assert!(matches!(err, AppError::ProtectedTemplate(id) if id == sistema.id));

    state.report_service.delete_template(proprio.id).await.unwrap();
    let err = state.report_service.delete_template(proprio.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));

    assert_eq!(state.report_service.templates(ReportKind::Territorios).await.unwrap().len(), 1);
}

#[tokio::test]
async fn agendamento_mensal_nao_perde_o_dia_31() {
    let state = setup().await;
    let u = user(&state, "ruth@congregacao.org", PermissionLevel::Gestor).await;
    let r = report(&state, "Fechamento do mês", Some(u.id), false).await;

    let agendamento = state
        .report_service
        .create_schedule(NewReportSchedule {
            relatorio_id: r.id,
            usuario_id: u.id,
            frequencia: ScheduleFrequency::Mensal,
            hora: "08:00".to_string(),
            enviar_email: false,
            emails_destinatarios: Vec::new(),
        })
        .await
        .unwrap();

    // Agendamento criado num dia 31
    let inicio = date(2027, 1, 31).and_hms_opt(8, 0, 0).unwrap();
    sqlx::query("UPDATE relatorio_agendamentos SET proxima_execucao = ?, dia_referencia = 31 WHERE id = ?")
        .bind(inicio)
        .bind(agendamento.id)
        .execute(&state.db_pool)
        .await
        .unwrap();

    let mut ran_at = inicio;
    let mut proximas = Vec::new();
    for _ in 0..3 {
        let s = state.report_service.mark_schedule_run(agendamento.id, ran_at).await.unwrap();
        proximas.push(s.proxima_execucao.date());
        ran_at = s.proxima_execucao;
    }
    assert_eq!(proximas, vec![date(2027, 2, 28), date(2027, 3, 31), date(2027, 4, 30)]);
}

#[tokio::test]
async fn cache_com_limite_zero_mantem_a_ultima_geracao() {
    let mut config = test_config();
    config.max_cached_reports = 0;
    let state = setup_with(config).await;
    let r = report(&state, "Sem cache", None, false).await;

    let guardado = state.report_service.store_result(r.id, json!({ "total": 3 })).await.unwrap();
    let ultimo = state.report_service.latest_result(r.id).await.unwrap().unwrap();
    assert_eq!(ultimo.id, guardado.id);

    let mut config = test_config();
    config.max_cached_reports = -5;
    let state = setup_with(config).await;
    let r = report(&state, "Limite negativo", None, false).await;
    for i in 0..3 {
        state.report_service.store_result(r.id, json!([i])).await.unwrap();
    }
    assert_eq!(count(&state, "SELECT COUNT(*) FROM relatorio_resultados").await, 1);
}
