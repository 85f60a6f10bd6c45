// ==========================================
// Disputa concorrente de iniciar na mesma fase
// ==========================================
// Vários operadores disparam iniciar() ao mesmo tempo na mesma
// fase do mesmo lote: exatamente um vence, os demais recebem
// FaseOcupada e o banco termina com um único apontamento aberto.
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;
use std::thread;

use producao_mes::config::ConfigEstatica;
use producao_mes::engine::{ApontamentoEngine, EngineError};
use producao_mes::repository::{
    ApontamentoRepository, FaseRepository, LoteRepository, MaquinaRepository, ProdutoRepository,
};

const OPERADORES: i64 = 8;

#[test]
fn test_iniciar_concorrente_um_unico_vencedor() {
    let (_tmp, db_path) = test_helpers::create_test_db().unwrap();
    let conn = test_helpers::open_test_connection(&db_path).unwrap();
    let seed = test_helpers::seed_corte_solda_pintura(conn.clone()).unwrap();

    let lote_repo = Arc::new(LoteRepository::from_connection(conn.clone()).unwrap());
    let fase_repo = Arc::new(FaseRepository::from_connection(conn.clone()).unwrap());
    let apontamento_repo = Arc::new(ApontamentoRepository::from_connection(conn.clone()).unwrap());
    let maquina_repo = Arc::new(MaquinaRepository::from_connection(conn.clone()).unwrap());
    let produto_repo = ProdutoRepository::from_connection(conn).unwrap();

    let rota = produto_repo.rota_do_produto(seed.produto_id).unwrap();
    let lote = lote_repo
        .criar("OP-RACE", seed.produto_id, 20, false, &rota)
        .unwrap();

    let engine = Arc::new(ApontamentoEngine::new(
        lote_repo,
        fase_repo,
        apontamento_repo.clone(),
        maquina_repo,
        Arc::new(ConfigEstatica::new()),
    ));

    let mut handles = Vec::new();
    for operador_id in 1..=OPERADORES {
        let engine = engine.clone();
        let lote_id = lote.id;
        let fase_id = seed.fase_corte;
        handles.push(thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(engine.iniciar(lote_id, fase_id, operador_id, None, None))
        }));
    }

    let mut vencedores = 0;
    let mut ocupadas = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(apontamento) => {
                vencedores += 1;
                assert_eq!(apontamento.lote_id, lote.id);
                assert_eq!(apontamento.fase_id, seed.fase_corte);
            }
            Err(EngineError::FaseOcupada { lote_id, fase_id, .. }) => {
                ocupadas += 1;
                assert_eq!(lote_id, lote.id);
                assert_eq!(fase_id, seed.fase_corte);
            }
            Err(outro) => panic!("erro inesperado na disputa: {:?}", outro),
        }
    }

    assert_eq!(vencedores, 1);
    assert_eq!(ocupadas, OPERADORES - 1);

    // o banco tem exatamente um apontamento aberto na fase
    let aberto = apontamento_repo
        .aberto_da_fase(lote.id, seed.fase_corte)
        .unwrap();
    assert!(aberto.is_some());
    let todos = apontamento_repo.listar_do_lote(lote.id).unwrap();
    assert_eq!(todos.iter().filter(|a| a.esta_aberto()).count(), 1);
    assert_eq!(todos.len(), 1);
}
