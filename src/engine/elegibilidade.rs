// ==========================================
// Sistema MES - Elegibilidade de máquinas
// ==========================================
// Responsabilidade: dadas as máquinas de uma fase, retornar as
// ATIVAS em ordem de preferência e validar a seleção feita no
// início do apontamento.
// A lista é sugestiva por padrão; sob política OBRIGATORIA,
// iniciar sem máquina em fase que possui máquinas ativas falha.
// ==========================================

use crate::domain::types::PoliticaMaquina;
use crate::domain::Maquina;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::MaquinaRepository;
use std::sync::Arc;

pub struct ElegibilidadeMaquinas {
    maquina_repo: Arc<MaquinaRepository>,
}

impl ElegibilidadeMaquinas {
    pub fn new(maquina_repo: Arc<MaquinaRepository>) -> Self {
        Self { maquina_repo }
    }

    /// Máquinas ativas da fase, em ordem de preferência
    pub fn ativas_da_fase(&self, fase_id: i64) -> EngineResult<Vec<Maquina>> {
        let todas = self.maquina_repo.listar_da_fase(fase_id)?;
        Ok(todas.into_iter().filter(|m| m.esta_ativa()).collect())
    }

    /// Valida a seleção de máquina para o início de um apontamento
    ///
    /// - política OBRIGATORIA + fase com máquinas ativas + nenhuma
    ///   selecionada => MaquinaObrigatoria
    /// - máquina selecionada precisa estar ativa e pertencer à fase
    /// - fase sem máquinas cadastradas nunca exige seleção
    pub fn validar_selecao(
        &self,
        fase_id: i64,
        maquina_id: Option<i64>,
        politica: PoliticaMaquina,
    ) -> EngineResult<()> {
        let elegiveis = self.ativas_da_fase(fase_id)?;

        match maquina_id {
            None => {
                if politica == PoliticaMaquina::Obrigatoria && !elegiveis.is_empty() {
                    return Err(EngineError::MaquinaObrigatoria { fase_id });
                }
                Ok(())
            }
            Some(id) => {
                if elegiveis.iter().any(|m| m.id == id) {
                    Ok(())
                } else {
                    Err(EngineError::MaquinaInelegivel {
                        maquina_id: id,
                        fase_id,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MaquinaStatus;
    use crate::repository::FaseRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (ElegibilidadeMaquinas, Arc<MaquinaRepository>, i64) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let fases = FaseRepository::from_connection(conn.clone()).unwrap();
        let fase = fases.inserir("USINAGEM", "Usinagem", 90, false).unwrap();
        let maquinas = Arc::new(MaquinaRepository::from_connection(conn).unwrap());
        let engine = ElegibilidadeMaquinas::new(maquinas.clone());
        (engine, maquinas, fase.id)
    }

    #[test]
    fn test_somente_ativas_em_ordem() {
        let (engine, maquinas, fase_id) = setup();
        let a = maquinas.inserir("TRN-01", "Torno 01", fase_id, 2).unwrap();
        let b = maquinas.inserir("TRN-02", "Torno 02", fase_id, 1).unwrap();
        maquinas
            .atualizar_status(a.id, MaquinaStatus::Manutencao)
            .unwrap();

        let ativas = engine.ativas_da_fase(fase_id).unwrap();
        assert_eq!(ativas.len(), 1);
        assert_eq!(ativas[0].id, b.id);
    }

    #[test]
    fn test_politica_opcional_nao_exige() {
        let (engine, maquinas, fase_id) = setup();
        maquinas.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();

        engine
            .validar_selecao(fase_id, None, PoliticaMaquina::Opcional)
            .unwrap();
    }

    #[test]
    fn test_politica_obrigatoria_exige() {
        let (engine, maquinas, fase_id) = setup();
        maquinas.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();

        let err = engine
            .validar_selecao(fase_id, None, PoliticaMaquina::Obrigatoria)
            .unwrap_err();
        assert!(matches!(err, EngineError::MaquinaObrigatoria { .. }));
    }

    #[test]
    fn test_fase_sem_maquinas_nunca_exige() {
        let (engine, _maquinas, fase_id) = setup();
        engine
            .validar_selecao(fase_id, None, PoliticaMaquina::Obrigatoria)
            .unwrap();
    }

    #[test]
    fn test_maquina_inelegivel() {
        let (engine, maquinas, fase_id) = setup();
        let m = maquinas.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();
        maquinas
            .atualizar_status(m.id, MaquinaStatus::Inativa)
            .unwrap();

        let err = engine
            .validar_selecao(fase_id, Some(m.id), PoliticaMaquina::Opcional)
            .unwrap_err();
        assert!(matches!(err, EngineError::MaquinaInelegivel { .. }));
    }
}
