// ==========================================
// Importação de catálogo via CSV
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::fs;

use producao_mes::api::CatalogoApi;
use producao_mes::importer::{CatalogoImporter, ImportError};

#[test]
fn test_importa_diretorio_completo() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("produtos.csv"),
        "codigo,descricao\nCHASSI-01,Chassi soldado\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("fases.csv"),
        "codigo,nome,tempo_estimado_minutos,requer_aprovacao\n\
         CORTE,Corte de chapa,30,nao\n\
         SOLDA,Solda estrutural,45,sim\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("checklist.csv"),
        "fase_codigo,descricao,obrigatorio,ordem\n\
         SOLDA,Conferir alinhamento,sim,1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("maquinas.csv"),
        "codigo,nome,fase_codigo,ordem\n\
         SOLDA-01,Célula de solda 1,SOLDA,1\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("rotas.csv"),
        "produto_codigo,fase_codigo,ordem,tempo_estimado_minutos,tempo_prateleira_horas\n\
         CHASSI-01,CORTE,1,30,\n\
         CHASSI-01,SOLDA,2,45,24\n",
    )
    .unwrap();

    let importer = CatalogoImporter::from_connection(conn.clone()).unwrap();
    let resumos = importer.importar_diretorio(dir.path()).unwrap();

    assert_eq!(resumos.len(), 5);
    for resumo in &resumos {
        assert!(resumo.rejeitados.is_empty(), "{:?}", resumo);
    }

    // catálogo ficou utilizável de ponta a ponta
    let catalogo = CatalogoApi::from_connection(conn).unwrap();
    let produto = catalogo.listar_produtos().unwrap().remove(0);
    let rota = catalogo.rota_do_produto(produto.id).unwrap();
    assert_eq!(rota.len(), 2);
    assert_eq!(rota[1].tempo_prateleira_horas, Some(24));
    let lote = catalogo.criar_lote("OP-IMP", produto.id, 1, false).unwrap();
    assert_eq!(lote.produto_id, produto.id);
}

#[test]
fn test_linhas_ruins_viram_rejeicoes_sem_derrubar_o_arquivo() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("fases.csv"),
        "codigo,nome,tempo_estimado_minutos,requer_aprovacao\n\
         CORTE,Corte de chapa,30,nao\n\
         ,Sem código,10,nao\n\
         SOLDA,Solda estrutural,45,talvez\n\
         CORTE,Duplicada,30,nao\n",
    )
    .unwrap();

    let importer = CatalogoImporter::from_connection(conn).unwrap();
    let resumo = importer
        .importar_fases(&dir.path().join("fases.csv"))
        .unwrap();

    assert_eq!(resumo.importados, 1);
    assert_eq!(resumo.rejeitados.len(), 3);
    // linha 3: código vazio; linha 4: booleano ilegível; linha 5: duplicata
    assert_eq!(resumo.rejeitados[0].linha, 3);
    assert!(resumo.rejeitados[1].motivo.contains("requer_aprovacao"));
}

#[test]
fn test_rota_com_fase_desconhecida_rejeita_o_produto_inteiro() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rotas.csv"),
        "produto_codigo,fase_codigo,ordem,tempo_estimado_minutos,tempo_prateleira_horas\n\
         CHASSI-01,CORTE,1,30,\n\
         CHASSI-01,FANTASMA,2,10,\n",
    )
    .unwrap();

    let importer = CatalogoImporter::from_connection(conn.clone()).unwrap();
    let resumo = importer
        .importar_rotas(&dir.path().join("rotas.csv"))
        .unwrap();

    assert_eq!(resumo.importados, 0);
    assert_eq!(resumo.rejeitados.len(), 1);
    assert!(resumo.rejeitados[0].motivo.contains("FANTASMA"));

    // a rota original do produto permanece intacta
    let catalogo = CatalogoApi::from_connection(conn).unwrap();
    assert_eq!(catalogo.rota_do_produto(seed.produto_id).unwrap().len(), 3);
}

#[test]
fn test_arquivo_ausente_e_erro_direto() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();

    let importer = CatalogoImporter::from_connection(conn).unwrap();
    let err = importer
        .importar_fases(std::path::Path::new("/nao/existe/fases.csv"))
        .unwrap_err();
    assert!(matches!(err, ImportError::ArquivoNaoEncontrado(_)));
}
