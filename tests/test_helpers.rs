// ==========================================
// Funções auxiliares de teste
// ==========================================
// Responsabilidade: banco temporário com schema completo e um
// catálogo mínimo de três fases (corte, solda, pintura)
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use producao_mes::config::ConfigManager;
use producao_mes::repository::{
    ApontamentoRepository, FaseRepository, LoteRepository, MaquinaRepository, ProdutoRepository,
};
use producao_mes::RotaFase;

/// Cria um banco temporário e roda o DDL de todas as tabelas
///
/// O NamedTempFile precisa permanecer vivo durante o teste.
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_test_connection(&db_path)?;
    let _ = FaseRepository::from_connection(conn.clone())?;
    let _ = ProdutoRepository::from_connection(conn.clone())?;
    let _ = LoteRepository::from_connection(conn.clone())?;
    let _ = MaquinaRepository::from_connection(conn.clone())?;
    let _ = ApontamentoRepository::from_connection(conn.clone())?;
    let _ = ConfigManager::from_connection(conn)?;

    Ok((temp_file, db_path))
}

pub fn open_test_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(producao_mes::db::open_shared_connection(db_path)?)
}

/// Ids do catálogo semeado por seed_corte_solda_pintura
pub struct CatalogoSeed {
    pub produto_id: i64,
    pub fase_corte: i64,
    pub fase_solda: i64,
    pub fase_pintura: i64,
    /// item obrigatório do checklist da solda
    pub item_solda_obrigatorio: i64,
    /// item opcional do checklist da solda
    pub item_solda_opcional: i64,
    pub maquina_solda: i64,
}

/// Produto "CHASSI-01" com rota corte(1) -> solda(2) -> pintura(3),
/// checklist na solda e uma máquina de solda
pub fn seed_corte_solda_pintura(
    conn: Arc<Mutex<Connection>>,
) -> Result<CatalogoSeed, Box<dyn Error>> {
    let fase_repo = FaseRepository::from_connection(conn.clone())?;
    let produto_repo = ProdutoRepository::from_connection(conn.clone())?;
    let maquina_repo = MaquinaRepository::from_connection(conn)?;

    let corte = fase_repo.inserir("CORTE", "Corte de chapa", 30, false)?;
    let solda = fase_repo.inserir("SOLDA", "Solda estrutural", 45, true)?;
    let pintura = fase_repo.inserir("PINT", "Pintura final", 60, false)?;

    let obrigatorio =
        fase_repo.inserir_item_checklist(solda.id, "Conferir alinhamento", true, 1)?;
    let opcional = fase_repo.inserir_item_checklist(solda.id, "Registrar foto", false, 2)?;

    let maquina = maquina_repo.inserir("SOLDA-01", "Célula de solda 1", solda.id, 1)?;

    let produto = produto_repo.inserir("CHASSI-01", "Chassi soldado")?;
    produto_repo.anexar_rota(
        produto.id,
        &[
            RotaFase::new(corte.id, 1, 30),
            RotaFase::new(solda.id, 2, 45),
            RotaFase::new(pintura.id, 3, 60),
        ],
    )?;

    Ok(CatalogoSeed {
        produto_id: produto.id,
        fase_corte: corte.id,
        fase_solda: solda.id,
        fase_pintura: pintura.id,
        item_solda_obrigatorio: obrigatorio.id,
        item_solda_opcional: opcional.id,
        maquina_solda: maquina.id,
    })
}
