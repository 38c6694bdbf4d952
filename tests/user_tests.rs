mod common;

use chrono::{Duration, Utc};
use common::{count, setup, setup_with, test_config, user};
use serde_json::json;
use territorios::{
    AppError,
    models::{
        activity::ActionKind,
        notification::{NewNotification, NotificationKind},
        reports::{NewSavedReport, ReportKind, SharePermission},
        user::{NewUser, NewUserProfile, PermissionLevel, SessionOrigin},
    },
};

#[tokio::test]
async fn email_duplicado_e_recusado() {
    let state = setup().await;
    user(&state, "ana@congregacao.org", PermissionLevel::Basico).await;

    let err = state
        .user_service
        .create_user(NewUser {
            nome: "Outra Ana".to_string(),
            email: "ana@congregacao.org".to_string(),
            senha: "outrasenha".to_string(),
            nivel_permissao: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::EmailAlreadyExists), "{:?}", err);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM usuarios").await, 1);
}

#[tokio::test]
async fn senha_e_guardada_como_hash() {
    let state = setup().await;
    let u = user(&state, "bruno@congregacao.org", PermissionLevel::Gestor).await;

    assert_ne!(u.senha_hash, "segredo123");
    assert!(bcrypt::verify("segredo123", &u.senha_hash).unwrap());
    assert!(u.ativo);
    assert!(u.is_manager());

    // O hash nunca vai para o JSON
    let json = serde_json::to_value(&u).unwrap();
    assert!(json.get("senhaHash").is_none());
    assert_eq!(json["nivelPermissao"], "gestor");

    let gravado: i64 = sqlx::query_scalar("SELECT nivel_permissao FROM usuarios WHERE id = ?")
        .bind(u.id)
        .fetch_one(&state.db_pool)
        .await
        .unwrap();
    assert_eq!(gravado, 2);

    let err = state
        .user_service
        .create_user(NewUser {
            nome: "Curta".to_string(),
            email: "curta@congregacao.org".to_string(),
            senha: "123".to_string(),
            nivel_permissao: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn permissoes_ativacao_e_preferencias() {
    let state = setup().await;
    let u = user(&state, "carla@congregacao.org", PermissionLevel::Basico).await;

    let u = state.user_service.change_permission(u.id, PermissionLevel::Admin).await.unwrap();
    assert_eq!(u.nivel_permissao, PermissionLevel::Admin);

    state.user_service.set_active(u.id, false).await.unwrap();
    assert!(state.user_service.list_active_users().await.unwrap().is_empty());
    assert_eq!(state.user_service.list_users().await.unwrap().len(), 1);

    let u = state
        .user_service
        .update_preferences(u.id, json!({ "tema": "escuro", "itensPorPagina": 20 }))
        .await
        .unwrap();
    let prefs = u.preferencias.unwrap();
    assert_eq!(prefs.0["tema"], "escuro");

    let err = state.user_service.update_preferences(u.id, json!([1, 2])).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    state.user_service.touch(u.id).await.unwrap();
    let u = state.user_service.get_user(u.id).await.unwrap();
    assert!(u.ultima_atividade.is_some());

    let achado = state.user_service.find_by_email("carla@congregacao.org").await.unwrap();
    assert_eq!(achado.map(|x| x.id), Some(u.id));
}

#[tokio::test]
async fn perfis_e_configuracoes() {
    let state = setup().await;
    let u = user(&state, "davi@congregacao.org", PermissionLevel::Basico).await;

    state
        .user_service
        .add_profile(
            u.id,
            NewUserProfile {
                telefone: Some("(11) 99999-0000".to_string()),
                congregacao: Some("Central".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let perfis = state.user_service.profiles(u.id).await.unwrap();
    assert_eq!(perfis.len(), 1);
    assert_eq!(perfis[0].congregacao.as_deref(), Some("Central"));

    state.user_service.set_setting(u.id, "tema", Some("claro")).await.unwrap();
    let atualizado = state.user_service.set_setting(u.id, "tema", Some("escuro")).await.unwrap();
    assert_eq!(atualizado.valor.as_deref(), Some("escuro"));
    state.user_service.set_setting(u.id, "idioma", Some("pt-BR")).await.unwrap();

    let todas = state.user_service.settings(u.id).await.unwrap();
    assert_eq!(todas.len(), 2);
    assert_eq!(todas[0].chave, "idioma");

    let tema = state.user_service.setting(u.id, "tema").await.unwrap().unwrap();
    assert_eq!(tema.valor.as_deref(), Some("escuro"));
    assert!(state.user_service.setting(u.id, "fonte").await.unwrap().is_none());
}

#[tokio::test]
async fn sessoes_abrem_expiram_e_fecham() {
    let state = setup().await;
    let u = user(&state, "elisa@congregacao.org", PermissionLevel::Basico).await;

    let origem = SessionOrigin {
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("teste".to_string()),
    };
    let sessao = state.session_service.open(u.id, origem.clone()).await.unwrap();
    assert_eq!(sessao.token.len(), 32);
    assert!(sessao.ativa);
    assert!(sessao.data_expiracao > Utc::now().naive_utc() + Duration::minutes(29));

    let valida = state.session_service.find_valid(&sessao.token).await.unwrap();
    assert_eq!(valida.map(|s| s.id), Some(sessao.id));

    // Sessão com validade vencida
    let vencida = state
        .session_service
        .insert_with_token(u.id, "token-vencido", origem.clone(), Utc::now().naive_utc() - Duration::minutes(1))
        .await
        .unwrap();
    assert!(state.session_service.find_valid(&vencida.token).await.unwrap().is_none());
    assert_eq!(state.session_service.expire_stale().await.unwrap(), 1);
    assert_eq!(state.session_service.active_sessions(u.id).await.unwrap().len(), 1);

    assert!(state.session_service.close(&sessao.token).await.unwrap());
    assert!(!state.session_service.close(&sessao.token).await.unwrap());
    assert!(state.session_service.find_valid(&sessao.token).await.unwrap().is_none());

    // Encerramento lógico: as linhas continuam
    assert_eq!(count(&state, "SELECT COUNT(*) FROM sessoes").await, 2);

    let u = state.user_service.get_user(u.id).await.unwrap();
    assert!(u.ultima_atividade.is_some());
}

#[tokio::test]
async fn token_duplicado_e_recusado() {
    let state = setup().await;
    let u = user(&state, "fabio@congregacao.org", PermissionLevel::Basico).await;
    let expira = Utc::now().naive_utc() + Duration::hours(1);

    state
        .session_service
        .insert_with_token(u.id, "abc123", SessionOrigin::default(), expira)
        .await
        .unwrap();
    let err = state
        .session_service
        .insert_with_token(u.id, "abc123", SessionOrigin::default(), expira)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SessionTokenAlreadyExists), "{:?}", err);
}

#[tokio::test]
async fn usuario_inativo_nao_abre_sessao() {
    let state = setup().await;
    let u = user(&state, "gil@congregacao.org", PermissionLevel::Basico).await;
    state.user_service.set_active(u.id, false).await.unwrap();

    let err = state.session_service.open(u.id, SessionOrigin::default()).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));
}

#[tokio::test]
async fn excluir_usuario_remove_dependentes() {
    let state = setup().await;
    let u = user(&state, "helena@congregacao.org", PermissionLevel::Gestor).await;
    let outro = user(&state, "igor@congregacao.org", PermissionLevel::Admin).await;

    state.session_service.open(u.id, SessionOrigin::default()).await.unwrap();
    state
        .notification_service
        .notify(
            u.id,
            NewNotification {
                tipo: NotificationKind::Info,
                titulo: "Bem-vinda".to_string(),
                mensagem: "Conta criada".to_string(),
                link: None,
                entidade: None,
                entidade_id: None,
            },
        )
        .await
        .unwrap();
    state
        .activity_service
        .record_on(u.id, ActionKind::Login, "Entrou no sistema", "usuario", u.id)
        .await
        .unwrap();
    state.user_service.add_profile(u.id, NewUserProfile::default()).await.unwrap();
    state.user_service.set_setting(u.id, "tema", Some("escuro")).await.unwrap();

    let proprio = state
        .report_service
        .create_report(NewSavedReport {
            nome: "Meu relatório".to_string(),
            tipo: ReportKind::Atendimentos,
            descricao: None,
            filtros: None,
            usuario_id: Some(u.id),
            compartilhado: false,
        })
        .await
        .unwrap();
    state.report_service.store_result(proprio.id, json!({ "total": 3 })).await.unwrap();
    let alheio = state
        .report_service
        .create_report(NewSavedReport {
            nome: "Relatório do Igor".to_string(),
            tipo: ReportKind::Territorios,
            descricao: None,
            filtros: None,
            usuario_id: Some(outro.id),
            compartilhado: false,
        })
        .await
        .unwrap();
    state.report_service.share(alheio.id, u.id, SharePermission::Leitura).await.unwrap();

    state.user_service.delete_user(u.id).await.unwrap();

    for table in [
        "sessoes",
        "notificacoes",
        "log_atividades",
        "perfis_usuario",
        "configuracoes_usuario",
        "relatorio_compartilhamentos",
    ] {
        let total = count(&state, &format!("SELECT COUNT(*) FROM {}", table)).await;
        assert_eq!(total, 0, "{} deveria estar vazia", table);
    }
    assert_eq!(count(&state, "SELECT COUNT(*) FROM relatorio_resultados").await, 0);

    // Só o relatório do outro usuário sobrevive
    let restantes: Vec<i64> = sqlx::query_scalar("SELECT id FROM relatorios")
        .fetch_all(&state.db_pool)
        .await
        .unwrap();
    assert_eq!(restantes, vec![alheio.id]);
}

#[tokio::test]
async fn tempo_de_sessao_fora_do_intervalo_falha_sem_panico() {
    for minutos in [i64::MAX, 0, -30] {
        let mut config = test_config();
        config.session_timeout_minutes = minutos;
        assert!(config.validate().is_err());

        let state = setup_with(config).await;
        let u = user(&state, "ana@exemplo.com", PermissionLevel::Basico).await;
        let err = state.session_service.open(u.id, SessionOrigin::default()).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)), "{:?}", err);
        assert_eq!(count(&state, "SELECT COUNT(*) FROM sessoes").await, 0);
    }
}
