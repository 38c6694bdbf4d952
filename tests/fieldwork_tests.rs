mod common;

use common::{count, date, fixture, setup};
use territorios::{
    AppError,
    models::fieldwork::{AssignmentStatus, NewAssignment, NewBuildingAssignment, NewOuting, WeekDay},
};

fn designacao(territorio_id: i64, saida_campo_id: i64, inicio: (u32, u32), fim: Option<(u32, u32)>) -> NewAssignment {
    NewAssignment {
        territorio_id,
        saida_campo_id,
        data_designacao: date(2026, inicio.0, inicio.1),
        data_devolucao: fim.map(|(m, d)| date(2026, m, d)),
        responsavel: Some("Carlos".to_string()),
    }
}

#[tokio::test]
async fn saidas_futuras_e_listagem() {
    let state = setup().await;

    for (nome, dia) in [("Antiga", 1), ("Próxima", 20), ("Depois", 27)] {
        let data = date(2026, 10, dia);
        state
            .fieldwork_service
            .create_outing(NewOuting {
                nome: nome.to_string(),
                data,
                dia_semana: WeekDay::of(data),
                horario: "19:30".to_string(),
                dirigente: None,
            })
            .await
            .unwrap();
    }

    let futuras = state.fieldwork_service.upcoming_outings(date(2026, 10, 16), 1).await.unwrap();
    assert_eq!(futuras.len(), 1);
    assert_eq!(futuras[0].nome, "Próxima");

    let todas = state.fieldwork_service.list_outings().await.unwrap();
    assert_eq!(todas[0].nome, "Depois");

    let err = state
        .fieldwork_service
        .create_outing(NewOuting {
            nome: "Sem hora".to_string(),
            data: date(2026, 10, 20),
            dia_semana: WeekDay::Terca,
            horario: "de manhã".to_string(),
            dirigente: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn designacao_do_dia() {
    let state = setup().await;
    let fx = fixture(&state).await;
    let (t, s) = (fx.territorio.id, fx.saida.id);

    let antiga = state
        .fieldwork_service
        .assign_territory(designacao(t, s, (9, 1), Some((9, 30))))
        .await
        .unwrap();
    let atual = state
        .fieldwork_service
        .assign_territory(designacao(t, s, (10, 10), None))
        .await
        .unwrap();
    assert_eq!(atual.status, AssignmentStatus::Ativo);

    let dia = state
        .fieldwork_service
        .assignment_of_the_day(date(2026, 10, 16))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dia.designacao.id, atual.id);
    assert_eq!(dia.territorio_nome, "Território 7");
    assert_eq!(dia.saida_nome, "Saída de sábado");
    assert_eq!(dia.dia_semana, WeekDay::Sabado);

    // Em setembro vale a designação antiga
    let setembro = state
        .fieldwork_service
        .assignment_of_the_day(date(2026, 9, 15))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(setembro.designacao.id, antiga.id);

    // Antes de qualquer designação
    assert!(state
        .fieldwork_service
        .assignment_of_the_day(date(2026, 8, 1))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn concluir_designacao_grava_devolucao() {
    let state = setup().await;
    let fx = fixture(&state).await;

    let d = state
        .fieldwork_service
        .assign_territory(designacao(fx.territorio.id, fx.saida.id, (10, 1), None))
        .await
        .unwrap();

    let concluida = state
        .fieldwork_service
        .close_assignment(d.id, date(2026, 10, 15))
        .await
        .unwrap();
    assert_eq!(concluida.status, AssignmentStatus::Concluido);
    assert_eq!(concluida.data_devolucao, Some(date(2026, 10, 15)));

    assert!(state.fieldwork_service.active_assignments().await.unwrap().is_empty());
    assert!(state
        .fieldwork_service
        .assignment_of_the_day(date(2026, 10, 10))
        .await
        .unwrap()
        .is_none());

    let err = state
        .fieldwork_service
        .close_assignment(d.id, date(2026, 10, 16))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let err = state
        .fieldwork_service
        .close_assignment(999, date(2026, 10, 16))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));

    let historico = state
        .fieldwork_service
        .assignments_for_territory(fx.territorio.id)
        .await
        .unwrap();
    assert_eq!(historico.len(), 1);
}

#[tokio::test]
async fn devolucao_anterior_a_designacao_e_rejeitada() {
    let state = setup().await;
    let fx = fixture(&state).await;

    let err = state
        .fieldwork_service
        .assign_territory(designacao(fx.territorio.id, fx.saida.id, (10, 10), Some((10, 1))))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn designacao_de_predio() {
    let state = setup().await;
    let fx = fixture(&state).await;

    let err = state
        .fieldwork_service
        .assign_building(NewBuildingAssignment {
            imovel_id: fx.casa.id,
            responsavel: "Lúcia".to_string(),
            saida_campo_id: fx.saida.id,
            data_designacao: date(2026, 10, 1),
            data_devolucao: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let d = state
        .fieldwork_service
        .assign_building(NewBuildingAssignment {
            imovel_id: fx.predio.id,
            responsavel: "Lúcia".to_string(),
            saida_campo_id: fx.saida.id,
            data_designacao: date(2026, 10, 1),
            data_devolucao: Some(date(2026, 10, 31)),
        })
        .await
        .unwrap();

    let ativa = state
        .fieldwork_service
        .active_assignment_for_building(fx.predio.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ativa.designacao.id, d.id);
    assert_eq!(ativa.imovel_numero, "20");
    assert_eq!(state.fieldwork_service.active_building_assignments().await.unwrap().len(), 1);

    let concluida = state
        .fieldwork_service
        .close_building_assignment(d.id, date(2026, 10, 20))
        .await
        .unwrap();
    assert_eq!(concluida.status, AssignmentStatus::Concluido);
    assert!(state
        .fieldwork_service
        .active_assignment_for_building(fx.predio.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn excluir_saida_remove_designacoes() {
    let state = setup().await;
    let fx = fixture(&state).await;

    state
        .fieldwork_service
        .assign_territory(designacao(fx.territorio.id, fx.saida.id, (10, 1), None))
        .await
        .unwrap();

    state.fieldwork_service.delete_outing(fx.saida.id).await.unwrap();

    assert_eq!(count(&state, "SELECT COUNT(*) FROM designacoes").await, 0);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM territorios").await, 1);
}
