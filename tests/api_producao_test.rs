// ==========================================
// API de produção: consultas e QR
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use producao_mes::api::{ApiError, CatalogoApi, ProducaoApi};
use producao_mes::engine::QrPayload;

#[tokio::test]
async fn test_progressao_detalhada_resolve_dados_do_catalogo() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();
    let catalogo = CatalogoApi::from_connection(conn.clone()).unwrap();
    let producao = ProducaoApi::from_connection(conn).unwrap();

    let lote = catalogo
        .criar_lote("OP-VIEW", seed.produto_id, 2, false)
        .unwrap();

    let apt = producao
        .iniciar_apontamento(lote.id, seed.fase_corte, 55, None, None)
        .await
        .unwrap();

    let prog = producao.obter_progressao(lote.id).unwrap();
    assert_eq!(prog.lote.codigo, "OP-VIEW");
    assert_eq!(prog.fases.len(), 3);

    let corte = &prog.fases[0];
    assert_eq!(corte.codigo, "CORTE");
    assert_eq!(corte.nome, "Corte de chapa");
    assert_eq!(corte.tempo_estimado_minutos, 30);
    assert_eq!(corte.operador_em_andamento, Some(55));

    // a visão serializa para o front sem perder os campos
    let json = serde_json::to_value(&prog).unwrap();
    assert_eq!(json["progresso_pct"], 0);
    assert_eq!(json["fases"][0]["status"], "EM_ANDAMENTO");

    producao.finalizar_apontamento(apt.id, None).await.unwrap();
    let prog = producao.obter_progressao(lote.id).unwrap();
    assert_eq!(prog.fases_concluidas, 1);
    assert!(prog.fases[1].proxima);
}

#[tokio::test]
async fn test_checklist_do_apontamento_pareia_respostas() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();
    let catalogo = CatalogoApi::from_connection(conn.clone()).unwrap();
    let producao = ProducaoApi::from_connection(conn).unwrap();

    let lote = catalogo.criar_lote("OP-CHK", seed.produto_id, 1, false).unwrap();
    let apt_corte = producao
        .iniciar_apontamento(lote.id, seed.fase_corte, 1, None, None)
        .await
        .unwrap();
    producao.finalizar_apontamento(apt_corte.id, None).await.unwrap();

    let apt_solda = producao
        .iniciar_apontamento(lote.id, seed.fase_solda, 1, Some(seed.maquina_solda), None)
        .await
        .unwrap();

    // antes de responder: dois itens, nenhum com resposta
    let itens = producao.checklist_do_apontamento(apt_solda.id).unwrap();
    assert_eq!(itens.len(), 2);
    assert!(itens.iter().all(|i| i.resposta.is_none()));

    producao
        .responder_checklist(
            apt_solda.id,
            seed.item_solda_obrigatorio,
            true,
            Some("alinhado com gabarito"),
        )
        .await
        .unwrap();

    // resposta pode ser revisada: último envio vale
    producao
        .responder_checklist(apt_solda.id, seed.item_solda_obrigatorio, true, None)
        .await
        .unwrap();

    let itens = producao.checklist_do_apontamento(apt_solda.id).unwrap();
    let obrigatorio = itens
        .iter()
        .find(|i| i.item.id == seed.item_solda_obrigatorio)
        .unwrap();
    assert!(obrigatorio.resposta.as_ref().unwrap().concluido);
    let opcional = itens
        .iter()
        .find(|i| i.item.id == seed.item_solda_opcional)
        .unwrap();
    assert!(opcional.resposta.is_none());

    // item de outra fase é rejeitado
    let item_corte = catalogo
        .adicionar_item_checklist(seed.fase_corte, "Medir chapa", true, 1)
        .unwrap();
    let err = producao
        .responder_checklist(apt_solda.id, item_corte.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ChecklistItemForaDaFase { .. }));
}

#[tokio::test]
async fn test_qr_de_lote_e_de_maquina() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();
    let catalogo = CatalogoApi::from_connection(conn.clone()).unwrap();
    let producao = ProducaoApi::from_connection(conn).unwrap();

    let lote = catalogo.criar_lote("OP-QR", seed.produto_id, 1, false).unwrap();

    // etiqueta de máquina gerada no cadastro resolve para o registro
    let maquina = producao.resolver_maquina_qr("maquina:SOLDA-01").unwrap();
    assert_eq!(maquina.id, seed.maquina_solda);

    // etiqueta de lote abre o apontamento da fase indicada
    let etiqueta = QrPayload::Lote {
        lote_id: lote.id,
        produto_id: seed.produto_id,
        fase_id: seed.fase_corte,
    }
    .to_string();
    let apt = producao
        .iniciar_por_qr(&etiqueta, 3, None, None)
        .await
        .unwrap();
    assert_eq!(apt.lote_id, lote.id);
    assert_eq!(apt.fase_id, seed.fase_corte);

    // cargas trocadas ou ilegíveis são rejeitadas na borda
    let err = producao.resolver_maquina_qr(&etiqueta).unwrap_err();
    assert!(matches!(err, ApiError::EntradaInvalida(_)));
    let err = producao
        .iniciar_por_qr("rabisco qualquer", 3, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::EntradaInvalida(_)));
}

#[test]
fn test_listar_maquinas_exige_fase_existente() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();
    let catalogo = CatalogoApi::from_connection(conn.clone()).unwrap();
    let producao = ProducaoApi::from_connection(conn).unwrap();

    // fase inexistente é erro, não lista vazia
    let err = producao.listar_maquinas_da_fase(9_999).unwrap_err();
    assert!(matches!(err, ApiError::NaoEncontrado(_)));
    let err = catalogo.listar_maquinas_da_fase(9_999).unwrap_err();
    assert!(matches!(err, ApiError::NaoEncontrado(_)));

    // fase real sem máquinas cadastradas devolve lista vazia
    assert!(producao
        .listar_maquinas_da_fase(seed.fase_corte)
        .unwrap()
        .is_empty());
    assert_eq!(
        producao.listar_maquinas_da_fase(seed.fase_solda).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_lotes_disponiveis_e_historico_do_operador() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();
    let catalogo = CatalogoApi::from_connection(conn.clone()).unwrap();
    let producao = ProducaoApi::from_connection(conn).unwrap();

    let comum = catalogo.criar_lote("OP-COMUM", seed.produto_id, 1, false).unwrap();
    let urgente = catalogo.criar_lote("OP-URGENTE", seed.produto_id, 1, true).unwrap();
    let cancelado = catalogo.criar_lote("OP-CANC", seed.produto_id, 1, false).unwrap();
    catalogo.cancelar_lote(cancelado.id).unwrap();

    let disponiveis = producao.listar_lotes_disponiveis().unwrap();
    let codigos: Vec<&str> = disponiveis.iter().map(|l| l.codigo.as_str()).collect();
    assert_eq!(codigos.first(), Some(&"OP-URGENTE"));
    assert!(codigos.contains(&"OP-COMUM"));
    assert!(!codigos.contains(&"OP-CANC"));

    // dois ciclos completos do operador 42
    for lote_id in [urgente.id, comum.id] {
        let apt = producao
            .iniciar_apontamento(lote_id, seed.fase_corte, 42, None, None)
            .await
            .unwrap();
        producao.finalizar_apontamento(apt.id, None).await.unwrap();
    }

    let historico = producao.historico_operador(42, 10).unwrap();
    assert_eq!(historico.len(), 2);
    assert!(historico.iter().all(|a| a.esta_finalizado()));

    let historico = producao.historico_operador(42, 1).unwrap();
    assert_eq!(historico.len(), 1);
}
